//! Event Types - 시스템 전체에서 사용되는 이벤트 타입 정의
//!
//! 코어가 UI 계층으로 내보내는 모든 이벤트를 정의합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Event ID
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// 새 이벤트 ID 생성
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event Category
// ============================================================================

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// 시스템 이벤트 (시작, 종료)
    System,
    /// 설정 이벤트 (Task 레지스트리 로드/리로드)
    Config,
    /// 세션 이벤트 (실행 시작, 상태 전이, 종료)
    Session,
    /// 출력 이벤트 (sink에 추가된 렌더링 청크)
    Output,
    /// 에러 이벤트
    Error,
    /// 사용자 정의 이벤트
    Custom,
}

impl EventCategory {
    /// 카테고리 문자열 반환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Config => "config",
            Self::Session => "session",
            Self::Output => "output",
            Self::Error => "error",
            Self::Custom => "custom",
        }
    }
}

// ============================================================================
// RunEvent
// ============================================================================

/// 코어에서 발행되는 이벤트
///
/// `event_type`은 `"session.state_changed"` 처럼 점으로 구분된 경로이며,
/// 구조화된 내용은 `payload`(JSON)에 담깁니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// 이벤트 고유 ID
    pub id: EventId,

    /// 이벤트 타입 (점 구분 경로)
    pub event_type: String,

    /// 카테고리
    pub category: EventCategory,

    /// 발생 소스 (컴포넌트 이름)
    pub source: String,

    /// 구조화된 페이로드
    pub payload: Value,

    /// 발생 시각
    pub timestamp: DateTime<Utc>,
}

impl RunEvent {
    /// 새 이벤트 생성
    pub fn new(event_type: impl Into<String>, category: EventCategory) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.into(),
            category,
            source: String::new(),
            payload: Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// 소스 지정
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// 페이로드 지정
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
