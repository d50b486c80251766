//! Error types for RunCode
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// RunCode 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    ConfigParse(String),

    // ========================================================================
    // Task 해석 관련
    // ========================================================================
    #[error("No task configured for file: {0}")]
    NoTaskForFile(String),

    #[error("Multiple tasks match file: {0}")]
    AmbiguousTask(String),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 사용자에게 보여줄 수 있는 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::ConfigParse(_)
                | Error::NoTaskForFile(_)
                | Error::AmbiguousTask(_)
                | Error::Spawn(_)
                | Error::Cancelled
        )
    }

    /// ConfigParse 에러 생성 헬퍼
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse(message.into())
    }

    /// Spawn 에러 생성 헬퍼
    pub fn spawn(message: impl Into<String>) -> Self {
        Error::Spawn(message.into())
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing() {
        assert!(Error::Cancelled.is_user_facing());
        assert!(Error::NoTaskForFile("main.py".into()).is_user_facing());
        assert!(!Error::Internal("oops".into()).is_user_facing());
    }

    #[test]
    fn test_display() {
        let err = Error::spawn("program not found");
        assert_eq!(err.to_string(), "Failed to spawn process: program not found");
    }
}
