//! Confidence-gated delivery.
//!
//! ```text
//! payload ─▸ DocumentSink (authoritative, errors propagate)
//!         ─▸ Global channel (best effort)
//!         ─▸ Alert channel (best effort, medium/low confidence only)
//! ```

use std::sync::Arc;

use super::payload::RoutingPayload;
use super::traits::{DocumentSink, NotificationSink, NotifyChannel};

/// What happened to one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed(String),
    /// Policy did not call for this channel, or it has no destination.
    Skipped,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Outcome of routing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteReport {
    pub document_id: String,
    pub global: Delivery,
    pub alert: Delivery,
}

/// Fans one payload out to the sinks. One attempt per sink, no retries.
pub struct Router {
    documents: Arc<dyn DocumentSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl Router {
    pub fn new(documents: Arc<dyn DocumentSink>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            documents,
            notifier,
        }
    }

    /// Channels a payload is delivered to under the confidence policy.
    pub fn channels_for(payload: &RoutingPayload) -> Vec<NotifyChannel> {
        if payload.distillation.confidence.needs_review() {
            vec![NotifyChannel::Global, NotifyChannel::Alert]
        } else {
            vec![NotifyChannel::Global]
        }
    }

    /// Deliver a payload.
    ///
    /// A document-store failure aborts routing and is returned; notification
    /// failures are logged and reported in the [`RouteReport`].
    pub async fn route(&self, payload: &RoutingPayload) -> anyhow::Result<RouteReport> {
        let document_id = match self.documents.create(payload).await {
            Ok(id) => {
                tracing::info!(sink = self.documents.name(), id = %id, "Saved distillation");
                id
            }
            Err(e) => {
                tracing::error!(sink = self.documents.name(), error = %e, "Document store write failed");
                return Err(e);
            }
        };

        let mut report = RouteReport {
            document_id,
            global: Delivery::Skipped,
            alert: Delivery::Skipped,
        };

        for channel in Self::channels_for(payload) {
            let delivery = self.notify(channel, payload).await;
            match channel {
                NotifyChannel::Global => report.global = delivery,
                NotifyChannel::Alert => report.alert = delivery,
            }
        }

        Ok(report)
    }

    async fn notify(&self, channel: NotifyChannel, payload: &RoutingPayload) -> Delivery {
        if !self.notifier.accepts(channel) {
            tracing::warn!(
                sink = self.notifier.name(),
                channel = channel.label(),
                "No destination configured, skipping notification"
            );
            return Delivery::Skipped;
        }
        match self.notifier.notify(channel, payload).await {
            Ok(()) => {
                tracing::info!(sink = self.notifier.name(), channel = channel.label(), "Notification sent");
                Delivery::Delivered
            }
            Err(e) => {
                tracing::error!(
                    sink = self.notifier.name(),
                    channel = channel.label(),
                    error = %e,
                    "Notification failed"
                );
                Delivery::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::testing::{payload_with, RecordingDocuments, RecordingNotifier};
    use crate::distill::Confidence;

    fn router(docs: &Arc<RecordingDocuments>, notifier: &Arc<RecordingNotifier>) -> Router {
        Router::new(docs.clone(), notifier.clone())
    }

    #[tokio::test]
    async fn high_confidence_goes_to_global_only() {
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let report = router(&docs, &notifier)
            .route(&payload_with(Confidence::High))
            .await
            .unwrap();

        assert_eq!(docs.created().len(), 1);
        assert_eq!(notifier.sent(), vec![NotifyChannel::Global]);
        assert_eq!(report.global, Delivery::Delivered);
        assert_eq!(report.alert, Delivery::Skipped);
    }

    #[tokio::test]
    async fn medium_and_low_also_alert() {
        for confidence in [Confidence::Medium, Confidence::Low] {
            let docs = Arc::new(RecordingDocuments::default());
            let notifier = Arc::new(RecordingNotifier::default());
            let report = router(&docs, &notifier)
                .route(&payload_with(confidence))
                .await
                .unwrap();
            assert_eq!(
                notifier.sent(),
                vec![NotifyChannel::Global, NotifyChannel::Alert]
            );
            assert!(report.alert.is_delivered());
        }
    }

    #[tokio::test]
    async fn global_failure_does_not_block_alert() {
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::failing_on(&[NotifyChannel::Global]));
        let report = router(&docs, &notifier)
            .route(&payload_with(Confidence::Low))
            .await
            .unwrap();

        assert!(matches!(report.global, Delivery::Failed(_)));
        assert_eq!(report.alert, Delivery::Delivered);
        assert_eq!(docs.created().len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_channel_is_skipped_not_delivered() {
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::without(&[NotifyChannel::Alert]));
        let report = router(&docs, &notifier)
            .route(&payload_with(Confidence::Low))
            .await
            .unwrap();

        assert_eq!(report.global, Delivery::Delivered);
        assert_eq!(report.alert, Delivery::Skipped);
        assert_eq!(notifier.sent(), vec![NotifyChannel::Global]);
    }

    #[tokio::test]
    async fn document_failure_aborts_routing() {
        let docs = Arc::new(RecordingDocuments::failing());
        let notifier = Arc::new(RecordingNotifier::default());
        let result = router(&docs, &notifier)
            .route(&payload_with(Confidence::Low))
            .await;

        assert!(result.is_err());
        assert!(notifier.sent().is_empty());
    }
}
