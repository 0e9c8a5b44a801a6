//! Queue store seam and row model.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Status ───────────────────────────────────────────────────────

/// Lifecycle of a queued entry: `pending → processing → complete | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl QueueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Whether the worker may move a row from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Complete)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Row ──────────────────────────────────────────────────────────

/// Primary key as stored: integer identity or UUID text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// One queue row. The store owns it; the worker only reads a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub raw_text: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    pub status: QueueStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl QueueEntry {
    /// `metadata.source` when it is a non-empty string.
    pub fn metadata_source(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("source"))
            .and_then(|s| s.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ── Store trait ──────────────────────────────────────────────────

/// Persistent work queue.
///
/// Errors from any method are queue transition failures and propagate.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Oldest `pending` row, if any. No writes.
    async fn oldest_pending(&self) -> anyhow::Result<Option<QueueEntry>>;

    /// Move a row from `pending` to `processing`, only if it is still
    /// `pending`. Returns `false` when another worker got there first.
    async fn claim(&self, id: &EntryId) -> anyhow::Result<bool>;

    async fn complete(&self, id: &EntryId, summary: &str, tags: &[String]) -> anyhow::Result<()>;

    /// Mark failed. Status only; no other field changes.
    async fn fail(&self, id: &EntryId) -> anyhow::Result<()>;
}
