//! Event Bus - 이벤트 브로드캐스트 시스템
//!
//! 코어 → UI 방향의 비동기 이벤트 발행/구독 시스템을 제공합니다.
//! UI 패널은 `receiver()`로 구독하고, 코어 컴포넌트는 `publish()`로 발행합니다.

use super::types::{EventCategory, RunEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

// ============================================================================
// EventBus
// ============================================================================

/// 이벤트 버스 설정
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// 브로드캐스트 채널 용량
    pub channel_capacity: usize,

    /// 이벤트 히스토리 보관 개수
    pub history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            history_size: 100,
        }
    }
}

/// 이벤트 버스
///
/// 코어 전체의 이벤트를 브로드캐스트합니다. 구독자가 없어도 발행은
/// 실패하지 않습니다 (UI가 아직 붙지 않은 상태 허용).
pub struct EventBus {
    /// 설정
    config: EventBusConfig,

    /// 브로드캐스트 채널 송신자
    sender: broadcast::Sender<RunEvent>,

    /// 이벤트 히스토리
    history: RwLock<Vec<RunEvent>>,

    /// 발행된 이벤트 수
    event_count: AtomicU64,
}

impl EventBus {
    /// 기본 설정으로 이벤트 버스 생성
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// 커스텀 설정으로 이벤트 버스 생성
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);

        Self {
            config,
            sender,
            history: RwLock::new(Vec::new()),
            event_count: AtomicU64::new(0),
        }
    }

    /// 이벤트 발행
    pub async fn publish(&self, event: RunEvent) {
        let event_count = self.event_count.fetch_add(1, Ordering::SeqCst);

        trace!(
            event_id = %event.id,
            event_type = %event.event_type,
            category = ?event.category,
            "Publishing event #{}", event_count + 1
        );

        // 히스토리에 추가
        {
            let mut history = self.history.write().await;
            history.push(event.clone());

            // 히스토리 크기 제한
            if history.len() > self.config.history_size {
                history.remove(0);
            }
        }

        // 브로드캐스트 채널로 전송 (구독자가 없으면 무시)
        let _ = self.sender.send(event);
    }

    /// 브로드캐스트 수신자 생성
    pub fn receiver(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }

    /// 최근 이벤트 히스토리 조회
    pub async fn history(&self, limit: Option<usize>) -> Vec<RunEvent> {
        let history = self.history.read().await;
        let limit = limit.unwrap_or(history.len());
        history.iter().rev().take(limit).cloned().collect()
    }

    /// 카테고리로 히스토리 검색
    pub async fn history_by_category(&self, category: EventCategory) -> Vec<RunEvent> {
        let history = self.history.read().await;
        history
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    /// 총 발행된 이벤트 수
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut rx = bus.receiver();

        bus.publish(RunEvent::new("session.started", EventCategory::Session))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, "session.started");
        assert_eq!(bus.event_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();

        // 구독자가 없어도 발행은 성공해야 함
        bus.publish(RunEvent::new("system.started", EventCategory::System))
            .await;

        assert_eq!(bus.event_count(), 1);
    }

    #[tokio::test]
    async fn test_history_limit() {
        let config = EventBusConfig {
            history_size: 5,
            ..Default::default()
        };
        let bus = EventBus::with_config(config);

        // 10개 이벤트 발행
        for i in 0..10 {
            let event = RunEvent::new(format!("test.event.{}", i), EventCategory::System);
            bus.publish(event).await;
        }

        // 히스토리는 최근 5개만 유지
        let history = bus.history(None).await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].event_type, "test.event.9");
    }

    #[tokio::test]
    async fn test_history_by_category() {
        let bus = EventBus::new();

        bus.publish(RunEvent::new("session.started", EventCategory::Session))
            .await;
        bus.publish(RunEvent::new("config.reloaded", EventCategory::Config))
            .await;

        let sessions = bus.history_by_category(EventCategory::Session).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].event_type, "session.started");
    }
}
