//! Summarization and confidence assignment.
//!
//! [`Distiller::distill`] is the interactive pass: a JSON summary call that
//! also grades confidence, then classification. [`Distiller::distill_light`]
//! is the queue pass: a plain summary call, local confidence estimate, then
//! classification of the summary. Both degrade to the trimmed raw text as
//! summary when the model is unavailable.

use std::sync::Arc;

use serde::Deserialize;

use super::classifier::Classifier;
use super::confidence::{self, ConfidenceEstimate};
use super::types::{Confidence, Distillation, Vocabulary};
use crate::llm::{ChatMessage, CompletionRequest, CompletionService, ModelTier};

const SUMMARY_TEMPERATURE: f64 = 0.4;

const DISTILL_SYSTEM_PROMPT: &str = r#"You are a thought distillation engine for a digital brain. Your job is to distill raw thoughts into structured knowledge.

Respond with a JSON object with the following fields:
- summary: A clinical, 1-2 sentence summary of the input, written in the third person
- confidence: "high", "medium", or "low", based on how certain the input sounds
- confidence_note: A short explanation if confidence is "medium" or "low", otherwise null

Your tone should be neutral and analytical. Do not offer opinions or commentary.
Maintain ambiguity when the input is vague or non-absolute. Do not combine unrelated ideas into one summary."#;

fn light_prompt(text: &str) -> String {
    format!(
        r#"You're a thought distillation engine for a digital brain. Your job is to extract a clear and meaningful summary that captures the emotional truth and intellectual core of the input.

Guidelines:
- Write in the user's natural voice, using third person.
- Maintain ambiguity when the user is vague or non-absolute.
- Prioritize clarity and emotional fidelity over cleverness or flair.
- Avoid awkward constructions or quotation marks.
- Do not combine unrelated ideas into one summary.

Input:
{text}

Distilled Summary:"#
    )
}

#[derive(Debug, Deserialize)]
struct SummaryReply {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    confidence_note: Option<String>,
}

/// Summary plus graded confidence, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub summary: String,
    pub confidence: Confidence,
    pub confidence_note: Option<String>,
    /// `true` when the raw text stood in for a model summary.
    pub degraded: bool,
}

/// Strip a ```json fence if the model wrapped its object in one.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Parse the JSON summary reply. `None` when it is unusable.
pub fn parse_summary_reply(reply: &str, raw: &str) -> Option<SummaryOutcome> {
    let parsed: SummaryReply = serde_json::from_str(strip_code_fence(reply)).ok()?;
    let summary = parsed.summary.trim().to_string();
    if summary.is_empty() {
        return None;
    }

    let (confidence, note) = match parsed.confidence.as_deref().and_then(Confidence::parse) {
        Some(c) => {
            let note = parsed
                .confidence_note
                .filter(|n| !n.trim().is_empty())
                .or_else(|| confidence::default_note(c));
            (c, note)
        }
        None => {
            let ConfidenceEstimate { confidence, note } = confidence::estimate(raw);
            (confidence, note)
        }
    };

    Some(SummaryOutcome {
        summary,
        confidence,
        confidence_note: note,
        degraded: false,
    })
}

fn degraded_outcome(raw: &str) -> SummaryOutcome {
    let ConfidenceEstimate { confidence, note } = confidence::estimate(raw);
    SummaryOutcome {
        summary: raw.trim().to_string(),
        confidence,
        confidence_note: note,
        degraded: true,
    }
}

/// Produces [`Distillation`]s from raw text.
pub struct Distiller {
    service: Arc<dyn CompletionService>,
    classifier: Classifier,
}

impl Distiller {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            classifier: Classifier::new(service.clone()),
            service,
        }
    }

    /// Summarize and grade confidence in one JSON call.
    pub async fn summarize(&self, raw: &str) -> SummaryOutcome {
        let request = CompletionRequest {
            tier: ModelTier::Quality,
            messages: vec![
                ChatMessage::system(DISTILL_SYSTEM_PROMPT),
                ChatMessage::user(format!("Input: \"\"\"{raw}\"\"\"")),
            ],
            temperature: SUMMARY_TEMPERATURE,
        };

        match self.service.complete(request).await {
            Ok(reply) => match parse_summary_reply(&reply, raw) {
                Some(outcome) => {
                    tracing::info!(confidence = %outcome.confidence, "Summarized entry");
                    outcome
                }
                None => {
                    tracing::warn!("Summary reply was not valid JSON, using raw text");
                    degraded_outcome(raw)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Summarization failed, using raw text");
                degraded_outcome(raw)
            }
        }
    }

    /// Plain-text summary for the queue pass.
    pub async fn summarize_plain(&self, raw: &str) -> String {
        let request =
            CompletionRequest::user_prompt(ModelTier::Quality, light_prompt(raw), SUMMARY_TEMPERATURE);
        match self.service.complete(request).await {
            Ok(summary) => summary.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Summarization failed, using raw text");
                raw.trim().to_string()
            }
        }
    }

    /// Interactive distillation of one entry.
    pub async fn distill(&self, raw: &str) -> Distillation {
        let outcome = self.summarize(raw).await;
        let classification = self.classifier.classify(raw, Vocabulary::Interactive).await;
        Distillation::new(
            outcome.summary,
            classification,
            outcome.confidence,
            outcome.confidence_note,
        )
    }

    /// Queue distillation: summarize, then tag the summary.
    pub async fn distill_light(&self, raw: &str) -> Distillation {
        let summary = self.summarize_plain(raw).await;
        let estimate = confidence::estimate(raw);
        let classification = self.classifier.classify(&summary, Vocabulary::Queue).await;
        Distillation::new(summary, classification, estimate.confidence, estimate.note)
    }
}
