//! Persistent queue processing.

pub mod traits;
pub mod worker;

pub use traits::{EntryId, QueueEntry, QueueStatus, QueueStore};
pub use worker::{DrainSummary, QueueWorker, WorkerOutcome};
