//! Queue worker: one pending row per pass.
//!
//! ```text
//! oldest pending ─▸ claim (pending → processing) ─▸ light distill
//!                                                 ─▸ route
//!                                                 ─▸ complete | failed
//! ```
//!
//! The claim is the first write and lands before any external call; the
//! terminal write is the last thing a pass does. Store errors propagate.

use std::sync::Arc;
use std::time::Duration;

use crate::distill::Distiller;
use crate::routing::{Router, RoutingPayload};

use super::traits::{EntryId, QueueStore};

/// Result of one worker pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Nothing pending.
    Idle,
    /// Another worker claimed the row first; nothing was written.
    Contended { id: EntryId },
    Completed { id: EntryId },
    /// Routing failed and the row was marked failed.
    Failed { id: EntryId, error: String },
}

impl WorkerOutcome {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Counts from a [`QueueWorker::drain`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub completed: usize,
    pub failed: usize,
    pub contended: usize,
}

impl DrainSummary {
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    /// Rows picked up, whether or not the claim was won.
    pub fn attempts(&self) -> usize {
        self.processed() + self.contended
    }

    fn record(&mut self, outcome: &WorkerOutcome) {
        match outcome {
            WorkerOutcome::Completed { .. } => self.completed += 1,
            WorkerOutcome::Failed { .. } => self.failed += 1,
            WorkerOutcome::Contended { .. } => self.contended += 1,
            WorkerOutcome::Idle => {}
        }
    }
}

pub struct QueueWorker {
    store: Arc<dyn QueueStore>,
    distiller: Distiller,
    router: Router,
    default_source: String,
}

impl QueueWorker {
    pub fn new(
        store: Arc<dyn QueueStore>,
        distiller: Distiller,
        router: Router,
        default_source: impl Into<String>,
    ) -> Self {
        Self {
            store,
            distiller,
            router,
            default_source: default_source.into(),
        }
    }

    /// Process the oldest pending row, if any.
    pub async fn process_next(&self) -> anyhow::Result<WorkerOutcome> {
        let Some(entry) = self.store.oldest_pending().await? else {
            tracing::info!("No entries to process");
            return Ok(WorkerOutcome::Idle);
        };

        if !self.store.claim(&entry.id).await? {
            tracing::info!(id = %entry.id, "Entry already claimed by another worker");
            return Ok(WorkerOutcome::Contended { id: entry.id });
        }
        tracing::info!(id = %entry.id, "Processing entry");

        let distillation = self.distiller.distill_light(&entry.raw_text).await;
        let source = entry
            .metadata_source()
            .unwrap_or(self.default_source.as_str())
            .to_string();
        let payload = RoutingPayload::new(distillation, entry.raw_text.clone(), source);

        match self.router.route(&payload).await {
            Ok(report) => {
                let d = &payload.distillation;
                self.store.complete(&entry.id, &d.summary, &d.tags).await?;
                tracing::info!(id = %entry.id, document = %report.document_id, "Processed entry");
                Ok(WorkerOutcome::Completed { id: entry.id })
            }
            Err(e) => {
                tracing::error!(id = %entry.id, error = %e, "Processing error");
                self.store.fail(&entry.id).await?;
                Ok(WorkerOutcome::Failed {
                    id: entry.id,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Process rows until the queue is idle or `max` rows were picked up.
    ///
    /// Lost claims count toward `max`. The same row losing its claim twice in
    /// a row ends the drain, since the store keeps offering a row it will not
    /// let this worker take.
    pub async fn drain(&self, max: Option<usize>) -> anyhow::Result<DrainSummary> {
        let mut summary = DrainSummary::default();
        let mut last_contended: Option<EntryId> = None;
        loop {
            if max.is_some_and(|max| summary.attempts() >= max) {
                break;
            }
            let outcome = self.process_next().await?;
            match &outcome {
                WorkerOutcome::Idle => break,
                WorkerOutcome::Contended { id } if last_contended.as_ref() == Some(id) => {
                    tracing::warn!(id = %id, "Row still pending after a lost claim, stopping drain");
                    break;
                }
                WorkerOutcome::Contended { id } => last_contended = Some(id.clone()),
                _ => last_contended = None,
            }
            summary.record(&outcome);
        }
        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            contended = summary.contended,
            "Queue drained"
        );
        Ok(summary)
    }

    /// Drain, sleep, repeat. Returns only on a store error.
    pub async fn watch(&self, interval: Duration, max: Option<usize>) -> anyhow::Result<()> {
        loop {
            self.drain(max).await?;
            tokio::time::sleep(interval).await;
        }
    }
}
