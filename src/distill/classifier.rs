//! Type and tag classification.
//!
//! The quality model picks one type from the active [`Vocabulary`] plus
//! 3-5 tags. Invalid or missing types go through [`fallback_type`], an
//! ordered first-match decision list over the lower-cased text.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::types::{normalize_tags, Classification, EntryType, Vocabulary, SENTINEL_TAG};
use crate::llm::{CompletionRequest, CompletionService, ModelTier};

// ── Fallback decision list ───────────────────────────────────────

/// (pattern, type) pairs; evaluated in order, first match wins.
const FALLBACK_RULES: &[(&str, EntryType)] = &[
    (
        r"(is better than|beats|wins over|more enjoyable than)",
        EntryType::Preference,
    ),
    (
        r"fur (child|baby)|my (cat|dog|pet).*?(child|love|bond)",
        EntryType::PersonalInfo,
    ),
    (
        r"\bi (prefer|like|enjoy|hate|can't stand)",
        EntryType::Preference,
    ),
    (
        r"\bi (want to|hope to|plan to)|my goal|my dream",
        EntryType::Goal,
    ),
    (r"habit|routine|workflow|system", EntryType::Workflow),
    (
        r"\bi (use|carry|film with|subscribe to)",
        EntryType::Resource,
    ),
    (
        r"when i was|growing up|\bi remember|in childhood",
        EntryType::PersonalHistory,
    ),
    (
        r"\bi (believe|think|feel|support|oppose)",
        EntryType::Belief,
    ),
    (
        r"\bi (fear|am afraid)|terrified|scares me",
        EntryType::Fear,
    ),
    (
        r"my (cat|dog|partner|house)|\bi (live with|have a cat|am single)",
        EntryType::PersonalInfo,
    ),
    (
        r"\bi (learned|realized|noticed)|this taught me",
        EntryType::Insight,
    ),
];

fn fallback_rules() -> &'static [(Regex, EntryType)] {
    static RULES: OnceLock<Vec<(Regex, EntryType)>> = OnceLock::new();
    RULES.get_or_init(|| {
        FALLBACK_RULES
            .iter()
            .map(|(p, t)| (Regex::new(p).expect("static regex"), *t))
            .collect()
    })
}

/// Rule-based type inference. Pure; defaults to `Insight`.
pub fn fallback_type(text: &str) -> EntryType {
    let lower = text.to_lowercase();
    fallback_rules()
        .iter()
        .find(|(re, _)| re.is_match(&lower))
        .map_or(EntryType::Insight, |(_, t)| *t)
}

/// [`fallback_type`] constrained to a vocabulary.
pub fn fallback_type_in(text: &str, vocabulary: Vocabulary) -> EntryType {
    let inferred = fallback_type(text);
    if vocabulary.contains(inferred) {
        inferred
    } else {
        vocabulary.catch_all()
    }
}

// ── Response parsing ─────────────────────────────────────────────

fn type_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)type:[ \t]*(.*)").expect("static regex"))
}

fn tags_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)tags:[ \t]*(.*)").expect("static regex"))
}

/// Raw fields extracted from a `Type: …` / `Tags: …` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub type_raw: String,
    pub tags: Vec<String>,
}

fn capture_line(re: &Regex, reply: &str) -> String {
    re.captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Split a tag line on `,` `|` or newline, strip quotes, drop blanks and
/// the sentinel tag, and dedupe case-insensitively.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for piece in raw.split([',', '|', '\n']) {
        let tag = piece.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case(SENTINEL_TAG) {
            continue;
        }
        if tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags
}

pub fn parse_reply(reply: &str) -> ParsedReply {
    ParsedReply {
        type_raw: capture_line(type_line_re(), reply),
        tags: parse_tags(&capture_line(tags_line_re(), reply)),
    }
}

fn build_prompt(text: &str, vocabulary: Vocabulary) -> String {
    let types = vocabulary
        .types()
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");
    let focus = match vocabulary {
        Vocabulary::Interactive => "Tags should reflect the core ideas. Avoid vague or generic terms.",
        Vocabulary::Queue => {
            "Tags should be short keywords (e.g. Diet, Focus, Sleep, Travel). Avoid vague or generic terms."
        }
    };

    format!(
        r#"You're a tagging and classification engine for a digital brain.

Your job is to return:
1. A single Type from this list:
{types}
2. 3-5 high-quality Tags (one or two words each, comma-separated)

Guidelines:
- {focus}
- If fewer than 2 strong tags apply, return ["General"].
- No hashtags or quotation marks.

Text:
{text}

Format:
Type: [One of the list above]
Tags: [Comma-separated list of tags]"#
    )
}

// ── Classifier ───────────────────────────────────────────────────

/// LLM classifier with rule-based fallback.
pub struct Classifier {
    service: Arc<dyn CompletionService>,
}

impl Classifier {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Classify one unit of text. Never fails.
    pub async fn classify(&self, text: &str, vocabulary: Vocabulary) -> Classification {
        let request = CompletionRequest::user_prompt(
            ModelTier::Quality,
            build_prompt(text, vocabulary),
            0.2,
        );

        match self.service.complete(request).await {
            Ok(reply) => {
                let parsed = parse_reply(&reply);
                let entry_type = match vocabulary.parse(&parsed.type_raw) {
                    Some(t) => t,
                    None => {
                        let fallback = fallback_type_in(text, vocabulary);
                        tracing::warn!(
                            returned = %parsed.type_raw,
                            fallback = %fallback,
                            "Model type not in vocabulary, using rule-based type"
                        );
                        fallback
                    }
                };
                Classification {
                    entry_type,
                    tags: normalize_tags(parsed.tags),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Tag/type extraction failed, using rule-based type");
                Classification {
                    entry_type: fallback_type_in(text, vocabulary),
                    tags: vec![SENTINEL_TAG.to_string()],
                }
            }
        }
    }
}
