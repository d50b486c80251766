//! Per-session output sink
//!
//! An append-only target for rendered output chunks. The session's writer
//! task appends; the UI consumes either live (broadcast subscription) or
//! after the fact (scrollback snapshot). Each sink is exclusively owned by
//! one session; there are no cross-session writes.

use crate::session::SessionId;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::{broadcast, RwLock};

/// Maximum retained chunks per sink
const DEFAULT_MAX_CHUNKS: usize = 10000;

/// Broadcast channel capacity
const BROADCAST_CAPACITY: usize = 1000;

/// Append-only rendered-output buffer for a single run session
#[derive(Debug)]
pub struct OutputSink {
    /// Owning session
    session_id: SessionId,

    /// Retained chunks, oldest first
    chunks: RwLock<VecDeque<String>>,

    /// Maximum chunks to keep
    max_chunks: usize,

    /// Real-time broadcast sender
    tx: broadcast::Sender<String>,

    /// Start time
    started_at: DateTime<Utc>,

    /// End time (stream closed or sink detached)
    ended_at: RwLock<Option<DateTime<Utc>>>,
}

impl OutputSink {
    pub fn new(session_id: SessionId) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            session_id,
            chunks: RwLock::new(VecDeque::new()),
            max_chunks: DEFAULT_MAX_CHUNKS,
            tx,
            started_at: Utc::now(),
            ended_at: RwLock::new(None),
        }
    }

    pub fn with_max_chunks(mut self, max: usize) -> Self {
        self.max_chunks = max;
        self
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Append one rendered chunk. Empty chunks are ignored (the renderer
    /// produces them for dropped escape codes).
    pub async fn append(&self, chunk: impl Into<String>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }

        // Live subscribers first, then scrollback.
        let _ = self.tx.send(chunk.clone());

        let mut chunks = self.chunks.write().await;
        if chunks.len() >= self.max_chunks {
            chunks.pop_front();
        }
        chunks.push_back(chunk);
    }

    /// Subscribe to chunks appended after this call
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Full retained scrollback as one string
    pub async fn snapshot(&self) -> String {
        self.chunks.read().await.iter().map(String::as_str).collect()
    }

    /// Number of retained chunks
    pub async fn chunk_count(&self) -> usize {
        self.chunks.read().await.len()
    }

    /// Mark the stream as ended; appends are still accepted (a killed
    /// process may flush buffered output after the kill).
    pub async fn mark_ended(&self) {
        let mut ended = self.ended_at.write().await;
        if ended.is_none() {
            *ended = Some(Utc::now());
        }
    }

    /// Whether the stream is still open
    pub async fn is_active(&self) -> bool {
        self.ended_at.read().await.is_none()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_snapshot() {
        let sink = OutputSink::new(SessionId::new());
        sink.append("hello\n").await;
        sink.append("world\n").await;

        assert_eq!(sink.snapshot().await, "hello\nworld\n");
        assert_eq!(sink.chunk_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_chunks_ignored() {
        let sink = OutputSink::new(SessionId::new());
        sink.append("").await;
        assert_eq!(sink.chunk_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_receives_appends() {
        let sink = OutputSink::new(SessionId::new());
        let mut rx = sink.subscribe();

        sink.append("chunk").await;
        assert_eq!(rx.recv().await.unwrap(), "chunk");
    }

    #[tokio::test]
    async fn test_retention_cap() {
        let sink = OutputSink::new(SessionId::new()).with_max_chunks(3);
        for i in 0..5 {
            sink.append(format!("{}\n", i)).await;
        }
        assert_eq!(sink.chunk_count().await, 3);
        assert_eq!(sink.snapshot().await, "2\n3\n4\n");
    }

    #[tokio::test]
    async fn test_mark_ended() {
        let sink = OutputSink::new(SessionId::new());
        assert!(sink.is_active().await);
        sink.mark_ended().await;
        assert!(!sink.is_active().await);

        // Late flush from a killed process still lands in the scrollback.
        sink.append("tail\n").await;
        assert_eq!(sink.snapshot().await, "tail\n");
    }
}
