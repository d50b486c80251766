//! Core Module - UI 경계 인터페이스
//!
//! 코어는 UI를 직접 알지 못합니다. 사용자와의 모든 상호작용
//! (placeholder 입력, 실행 중 세션 종료 확인, 모호한 Task 선택)은
//! `UiDelegate`를 통해서만 이루어집니다.
//!
//! UI 계층(에디터)에서 구현합니다.

use async_trait::async_trait;

// ============================================================================
// UI Delegate - UI 연동
// ============================================================================

/// UI 델리게이트
///
/// 코어가 사용자 입력을 필요로 할 때 호출하는 경계 인터페이스입니다.
#[async_trait]
pub trait UiDelegate: Send + Sync {
    /// 자유형 placeholder 값 입력 프롬프트 표시
    ///
    /// `None` 반환은 사용자가 프롬프트를 닫았음을 의미합니다.
    async fn prompt_input(&self, placeholder: &str) -> Option<String>;

    /// 확인 다이얼로그 표시 (예/아니오)
    async fn confirm(&self, message: &str) -> bool;

    /// 여러 Task가 매칭될 때 선택 다이얼로그 표시
    ///
    /// `candidates`는 Task 이름 목록이며, 반환값은 선택된 인덱스입니다.
    /// `None` 반환은 선택을 취소했음을 의미합니다.
    async fn choose_task(&self, file_name: &str, candidates: &[String]) -> Option<usize>;

    /// 알림 표시 (정보성)
    fn notify(&self, message: &str);

    /// 에러 표시
    fn show_error(&self, error: &str);
}
