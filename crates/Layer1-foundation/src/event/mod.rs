//! Event Module - 이벤트 시스템
//!
//! - `types.rs`: 이벤트 데이터 타입 (RunEvent, EventCategory)
//! - `bus.rs`: 브로드캐스트 이벤트 버스

mod bus;
mod types;

pub use bus::{EventBus, EventBusConfig};
pub use types::{EventCategory, EventId, RunEvent};
