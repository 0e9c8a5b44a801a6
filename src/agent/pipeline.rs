//! Interactive distillation pipeline.
//!
//! 1. **Gate**: local heuristic, then the fast model, decide whether to split
//! 2. **Split**: quality model, with a sentence-buffer fallback
//! 3. **Distill**: summary, confidence, type and tags for each entry
//! 4. **Route**: document store, then confidence-gated notifications
//!
//! Entries are processed one after another. A document-store failure on one
//! entry does not stop the rest; it is reported once every entry has been
//! attempted.

use crate::distill::{Distillation, Distiller, Splitter};
use crate::gatekeeper::{SplitGate, SplitVerdict};
use crate::routing::{RouteReport, Router, RoutingPayload};

/// Outcome for one routed entry.
#[derive(Debug, Clone)]
pub struct EntryReport {
    pub distillation: Distillation,
    /// `Err` holds the document-store error message.
    pub route: Result<RouteReport, String>,
}

/// Outcome of one interactive run.
#[derive(Debug, Clone)]
pub struct AgentReport {
    pub verdict: SplitVerdict,
    pub entries: Vec<EntryReport>,
}

impl AgentReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.route.is_err()).count()
    }
}

pub struct Agent {
    gate: SplitGate,
    splitter: Splitter,
    distiller: Distiller,
    router: Router,
    source: String,
}

impl Agent {
    pub fn new(
        gate: SplitGate,
        splitter: Splitter,
        distiller: Distiller,
        router: Router,
        source: impl Into<String>,
    ) -> Self {
        Self {
            gate,
            splitter,
            distiller,
            router,
            source: source.into(),
        }
    }

    /// Run every stage over `raw` and route the results.
    ///
    /// Errors on empty input. Document-store failures are collected in the
    /// report; use [`Agent::run`] to turn them into an error.
    pub async fn process(&self, raw: &str) -> anyhow::Result<AgentReport> {
        let text = raw.trim();
        if text.is_empty() {
            anyhow::bail!("Input text is empty");
        }

        let verdict = self.gate.evaluate(text).await;
        let entries = if verdict.should_split() {
            self.splitter.split(text).await
        } else {
            vec![text.to_string()]
        };
        tracing::info!(entries = entries.len(), split = verdict.should_split(), "Prepared entries");

        let mut reports = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let distillation = self.distiller.distill(entry).await;
            tracing::info!(
                entry = index + 1,
                entry_type = %distillation.entry_type,
                confidence = %distillation.confidence,
                tags = ?distillation.tags,
                "Distilled entry"
            );

            let payload = RoutingPayload::new(distillation, entry.clone(), self.source.clone());
            let route = self.router.route(&payload).await.map_err(|e| e.to_string());
            reports.push(EntryReport {
                distillation: payload.distillation,
                route,
            });
        }

        Ok(AgentReport {
            verdict,
            entries: reports,
        })
    }

    /// Like [`Agent::process`], but fails if any entry did not reach the
    /// document store.
    pub async fn run(&self, raw: &str) -> anyhow::Result<AgentReport> {
        let report = self.process(raw).await?;
        let failures = report.failures();
        if failures > 0 {
            anyhow::bail!(
                "{failures} of {} entries could not be saved to the document store",
                report.entries.len()
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::distill::{Confidence, EntryType, SENTINEL_TAG};
    use crate::llm::testing::ScriptedCompletion;
    use crate::llm::ModelTier;
    use crate::routing::testing::{RecordingDocuments, RecordingNotifier};
    use crate::routing::NotifyChannel;

    const LONG_TWO_THOUGHTS: &str = "I have been thinking a lot about moving to a smaller apartment closer to the office \
         because the commute is exhausting and I waste hours every week on the train. \
         Separately, I want to finally learn to cook proper Italian food and host dinners for friends \
         and family on weekends, but I keep putting it off so it never happens.";

    fn agent(
        llm: &Arc<ScriptedCompletion>,
        docs: &Arc<RecordingDocuments>,
        notifier: &Arc<RecordingNotifier>,
    ) -> Agent {
        Agent::new(
            SplitGate::new(llm.clone()),
            Splitter::new(llm.clone()),
            Distiller::new(llm.clone()),
            Router::new(docs.clone(), notifier.clone()),
            "CLI",
        )
    }

    #[tokio::test]
    async fn short_input_is_one_entry_without_split_calls() {
        let llm = Arc::new(ScriptedCompletion::new([
            Ok(r#"{"summary":"He loves hiking but dislikes bugs.","confidence":"high","confidence_note":null}"#),
            Ok("Type: Preference\nTags: Hiking, Outdoors, Insects"),
        ]));
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let report = agent(&llm, &docs, &notifier)
            .run("I love hiking but I hate the bugs.")
            .await
            .unwrap();

        assert_eq!(report.verdict, SplitVerdict::HeuristicRejected);
        assert_eq!(report.entries.len(), 1);
        assert!(llm.requests().iter().all(|r| r.tier == ModelTier::Quality));
        let d = &report.entries[0].distillation;
        assert_eq!(d.entry_type, EntryType::Preference);
        assert_eq!(d.tags, vec!["Hiking", "Outdoors", "Insects"]);
        assert_eq!(notifier.sent(), vec![NotifyChannel::Global]);
        assert_eq!(docs.created()[0].raw_input, "I love hiking but I hate the bugs.");
    }

    #[tokio::test]
    async fn model_declining_split_keeps_one_entry() {
        let llm = Arc::new(ScriptedCompletion::new([
            Ok("No"),
            Ok(r#"{"summary":"He is weighing a move and wants to cook more.","confidence":"medium","confidence_note":"Intentions only."}"#),
            Ok("Type: Goal\nTags: Housing, Cooking"),
        ]));
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let report = agent(&llm, &docs, &notifier).run(LONG_TWO_THOUGHTS).await.unwrap();

        assert_eq!(report.verdict, SplitVerdict::ModelDeclined);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(llm.requests()[0].tier, ModelTier::Fast);
        assert_eq!(report.entries[0].distillation.confidence, Confidence::Medium);
        assert_eq!(
            notifier.sent(),
            vec![NotifyChannel::Global, NotifyChannel::Alert]
        );
    }

    #[tokio::test]
    async fn confirmed_split_routes_each_entry() {
        let llm = Arc::new(ScriptedCompletion::new([
            Ok("Yes"),
            Ok("He wants to move closer to the office.\n\nHe wants to learn Italian cooking."),
            Ok(r#"{"summary":"He wants to move closer to work.","confidence":"high"}"#),
            Ok("Type: Goal\nTags: Housing, Commute"),
            Ok(r#"{"summary":"He wants to learn Italian cooking.","confidence":"high"}"#),
            Ok("Type: Goal\nTags: Cooking, Hosting"),
        ]));
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let report = agent(&llm, &docs, &notifier).run(LONG_TWO_THOUGHTS).await.unwrap();

        assert_eq!(report.verdict, SplitVerdict::Split);
        assert_eq!(report.entries.len(), 2);
        let created = docs.created();
        assert_eq!(created[0].raw_input, "He wants to move closer to the office.");
        assert_eq!(created[1].distillation.tags, vec!["Cooking", "Hosting"]);
    }

    #[tokio::test]
    async fn unreachable_service_still_routes_trimmed_input() {
        let llm = Arc::new(ScriptedCompletion::unreachable());
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let report = agent(&llm, &docs, &notifier)
            .run("   I always stretch before running.   ")
            .await
            .unwrap();

        let d = &report.entries[0].distillation;
        assert_eq!(d.summary, "I always stretch before running.");
        assert_eq!(d.tags, vec![SENTINEL_TAG]);
        assert_eq!(docs.created().len(), 1);
    }

    #[tokio::test]
    async fn document_failure_fails_the_run() {
        let llm = Arc::new(ScriptedCompletion::unreachable());
        let docs = Arc::new(RecordingDocuments::failing());
        let notifier = Arc::new(RecordingNotifier::default());
        let agent = agent(&llm, &docs, &notifier);

        let report = agent.process("I prefer tea to coffee.").await.unwrap();
        assert_eq!(report.failures(), 1);
        assert!(notifier.sent().is_empty());

        assert!(agent.run("I prefer tea to coffee.").await.is_err());
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let llm = Arc::new(ScriptedCompletion::unreachable());
        let docs = Arc::new(RecordingDocuments::default());
        let notifier = Arc::new(RecordingNotifier::default());
        assert!(agent(&llm, &docs, &notifier).run("   ").await.is_err());
        assert_eq!(llm.call_count(), 0);
    }
}
