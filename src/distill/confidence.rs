//! Deterministic confidence estimate from hedged phrasing.
//!
//! Used when the model gives no usable confidence, when summarization
//! fails, and by the queue pass, which makes no confidence call at all.

use std::sync::OnceLock;

use regex::Regex;

use super::types::Confidence;

const HEDGE_MARKERS: &[&str] = &[
    "maybe",
    "might",
    "perhaps",
    "probably",
    "possibly",
    "i think",
    "i guess",
    "i suppose",
    "not sure",
    "unsure",
    "kind of",
    "sort of",
    "could be",
    "seems",
    "i wonder",
    "i'm wondering",
    "idk",
];

fn hedge_res() -> &'static [(Regex, &'static str)] {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RES.get_or_init(|| {
        HEDGE_MARKERS
            .iter()
            .map(|m| {
                let re = Regex::new(&format!(r"\b{}\b", regex::escape(m))).expect("static regex");
                (re, *m)
            })
            .collect()
    })
}

/// Estimated confidence with the note explaining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceEstimate {
    pub confidence: Confidence,
    pub note: Option<String>,
}

/// Score how hedged a text is: no markers is high, one marker (or a
/// question) is medium, two or more is low.
pub fn estimate(text: &str) -> ConfidenceEstimate {
    let lower = text.to_lowercase();
    let found: Vec<&str> = hedge_res()
        .iter()
        .filter(|(re, _)| re.is_match(&lower))
        .map(|(_, m)| *m)
        .collect();
    let asks = lower.trim_end().ends_with('?');

    let confidence = match (found.len(), asks) {
        (0, false) => Confidence::High,
        (0, true) | (1, _) => Confidence::Medium,
        _ => Confidence::Low,
    };

    let note = match confidence {
        Confidence::High => None,
        _ if found.is_empty() => Some("Phrased as an open question.".to_string()),
        _ => Some(format!("Hedged phrasing: {}.", found.join(", "))),
    };

    ConfidenceEstimate { confidence, note }
}

/// Default note for a non-high confidence the model left unexplained.
pub fn default_note(confidence: Confidence) -> Option<String> {
    match confidence {
        Confidence::High => None,
        Confidence::Medium => Some("Some uncertainty in the phrasing.".to_string()),
        Confidence::Low => Some("Phrasing is tentative or speculative.".to_string()),
    }
}
