//! Entry splitting.
//!
//! The quality model decomposes a multi-thought entry into standalone
//! entries. When the model is unavailable, [`fallback_split`] groups
//! sentences by length without ever cutting across a logical connective.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::llm::{CompletionRequest, CompletionService, ModelTier};

/// Buffer length (characters) past which the fallback starts a new entry.
const FALLBACK_CHUNK_CHARS: usize = 220;

fn sentence_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.?!]\s+").expect("static regex"))
}

/// Connectives that bind neighbouring sentences into one thought.
fn glue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(but|because|so|although|while|even though|since|though)\b")
            .expect("static regex")
    })
}

fn build_prompt(text: &str) -> String {
    format!(
        r#"You're a splitting engine for a digital brain.

Your task is to split the following input into clean, standalone entries, but only when the ideas are **meaningfully independent**.

Do split:
- Distinct thoughts, reflections, or shifts in focus
- Unrelated facts, goals, or insights

Do NOT split:
- Related details (e.g., issue -> solution, plan -> tool)
- Cause-effect chains
- Contrasting pairs ("but", "however")
- Multiple aspects of a single process

Rules:
- Output each entry on its own line, no bullets or numbers
- Minimum 2-3 sentences per entry unless it's very distinct
- Do not create more than 4 entries unless clearly necessary

Text:
{text}

Entries:"#
    )
}

/// Split into sentences at terminal punctuation followed by whitespace.
/// The punctuation stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in sentence_boundary_re().find_iter(text) {
        // Terminal punctuation is a single ASCII byte.
        sentences.push(&text[start..=boundary.start()]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Deterministic sentence-grouping split.
///
/// Sentences accumulate into a buffer; the buffer is emitted when the next
/// sentence would push it past [`FALLBACK_CHUNK_CHARS`], unless the combined
/// text contains a glue word, in which case the sentences stay together.
pub fn fallback_split(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for sentence in split_sentences(text) {
        let candidate = if buffer.is_empty() {
            sentence.to_string()
        } else {
            format!("{buffer} {sentence}")
        };
        let too_long = candidate.chars().count() > FALLBACK_CHUNK_CHARS
            && !glue_re().is_match(&candidate);

        if too_long {
            let flushed = buffer.trim();
            if !flushed.is_empty() {
                chunks.push(flushed.to_string());
            }
            buffer = sentence.to_string();
        } else {
            buffer = candidate;
        }
    }

    let rest = buffer.trim();
    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

/// Parse line-delimited model output into entries.
pub fn parse_entries(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// LLM splitter with deterministic fallback.
pub struct Splitter {
    service: Arc<dyn CompletionService>,
}

impl Splitter {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Split `text` into standalone entries.
    ///
    /// Non-empty input always yields at least one entry.
    pub async fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let request = CompletionRequest::user_prompt(ModelTier::Quality, build_prompt(text), 0.2);
        match self.service.complete(request).await {
            Ok(reply) => {
                let entries = parse_entries(&reply);
                if entries.is_empty() {
                    tracing::warn!("Splitter returned no usable lines, keeping entry whole");
                    return vec![trimmed.to_string()];
                }
                if entries.len() > 1 {
                    tracing::info!(entries = entries.len(), "Split into entries");
                }
                entries
            }
            Err(e) => {
                tracing::warn!(error = %e, "Split failed, using sentence fallback");
                let entries = fallback_split(trimmed);
                if entries.is_empty() {
                    vec![trimmed.to_string()]
                } else {
                    entries
                }
            }
        }
    }
}
