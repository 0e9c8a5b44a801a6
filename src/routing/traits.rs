//! Sink seams.

use async_trait::async_trait;

use super::payload::RoutingPayload;

/// Notification destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyChannel {
    /// Receives every payload.
    Global,
    /// Receives payloads that need human review.
    Alert,
}

impl NotifyChannel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Alert => "alert",
        }
    }
}

/// Authoritative record store. Errors propagate to the caller.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    fn name(&self) -> &str;

    /// Create one record; returns the store's id for it.
    async fn create(&self, payload: &RoutingPayload) -> anyhow::Result<String>;
}

/// Best-effort message delivery. The router logs and suppresses errors.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `channel` has a destination. The router skips channels
    /// that do not.
    fn accepts(&self, _channel: NotifyChannel) -> bool {
        true
    }

    async fn notify(&self, channel: NotifyChannel, payload: &RoutingPayload) -> anyhow::Result<()>;
}
