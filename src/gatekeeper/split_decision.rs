//! LLM yes/no gate for splitting.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::heuristic;
use crate::llm::{CompletionRequest, CompletionService, ModelTier};

fn yes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^yes[\s.!]*$").expect("static regex"))
}

/// Outcome of the two-stage split gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitVerdict {
    /// Local heuristic saw nothing worth analysing; no model call made.
    HeuristicRejected,
    /// The model answered something other than "yes", or the call failed.
    ModelDeclined,
    /// The model confirmed two or more distinct thoughts.
    Split,
}

impl SplitVerdict {
    pub fn should_split(self) -> bool {
        matches!(self, Self::Split)
    }
}

fn build_prompt(text: &str) -> String {
    format!(
        r#"You are a split detection engine for a digital brain.

Your task: decide if this entry contains 2+ **distinct thoughts** that should be logged as separate entries.

Return exactly one word: "Yes" or "No".

Text:
{text}

Answer:"#
    )
}

/// Interpret a model reply. Anything but an affirmative is "no".
pub fn parse_reply(reply: &str) -> bool {
    yes_re().is_match(&reply.trim().to_lowercase())
}

/// Decides whether a text should go through the splitter.
pub struct SplitGate {
    service: Arc<dyn CompletionService>,
}

impl SplitGate {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Run the local heuristic, then ask the fast model only if it passed.
    pub async fn evaluate(&self, text: &str) -> SplitVerdict {
        if !heuristic::might_contain_multiple(text) {
            tracing::debug!("Split heuristic rejected entry");
            return SplitVerdict::HeuristicRejected;
        }
        if self.confirm(text).await {
            SplitVerdict::Split
        } else {
            SplitVerdict::ModelDeclined
        }
    }

    /// Ask the fast model for a yes/no. Fails closed.
    pub async fn confirm(&self, text: &str) -> bool {
        let request = CompletionRequest::user_prompt(ModelTier::Fast, build_prompt(text), 0.0);
        match self.service.complete(request).await {
            Ok(reply) => {
                let split = parse_reply(&reply);
                if split {
                    tracing::info!("Split detection: model confirmed multiple thoughts");
                } else {
                    tracing::info!(reply = %reply, "Split detection: model said no or was ambiguous");
                }
                split
            }
            Err(e) => {
                tracing::warn!(error = %e, "Split detection failed, keeping entry whole");
                false
            }
        }
    }
}
