//! Distillation record and its vocabularies.

use serde::{Deserialize, Serialize};

/// Tag used when too few meaningful tags were extracted.
pub const SENTINEL_TAG: &str = "General";

// ── Entry type ───────────────────────────────────────────────────

/// Semantic category of one thought.
///
/// Interactive and queue modes each accept a subset, see [`Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Preference,
    Goal,
    Workflow,
    Resource,
    #[serde(rename = "Personal History")]
    PersonalHistory,
    Belief,
    Fear,
    #[serde(rename = "Personal Info")]
    PersonalInfo,
    Insight,
    Routine,
    Story,
    Decision,
}

impl EntryType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Preference => "Preference",
            Self::Goal => "Goal",
            Self::Workflow => "Workflow",
            Self::Resource => "Resource",
            Self::PersonalHistory => "Personal History",
            Self::Belief => "Belief",
            Self::Fear => "Fear",
            Self::PersonalInfo => "Personal Info",
            Self::Insight => "Insight",
            Self::Routine => "Routine",
            Self::Story => "Story",
            Self::Decision => "Decision",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Vocabulary ───────────────────────────────────────────────────

/// The set of types a classification may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// Types for directly submitted thoughts.
    Interactive,
    /// Types for queued entries.
    Queue,
}

impl Vocabulary {
    const INTERACTIVE: &'static [EntryType] = &[
        EntryType::Preference,
        EntryType::Goal,
        EntryType::Workflow,
        EntryType::Resource,
        EntryType::PersonalHistory,
        EntryType::Belief,
        EntryType::Fear,
        EntryType::PersonalInfo,
        EntryType::Insight,
    ];

    const QUEUE: &'static [EntryType] = &[
        EntryType::Routine,
        EntryType::Belief,
        EntryType::Insight,
        EntryType::Workflow,
        EntryType::Resource,
        EntryType::Story,
        EntryType::Decision,
        EntryType::Goal,
    ];

    /// Members in prompt order.
    pub fn types(self) -> &'static [EntryType] {
        match self {
            Self::Interactive => Self::INTERACTIVE,
            Self::Queue => Self::QUEUE,
        }
    }

    pub fn contains(self, entry_type: EntryType) -> bool {
        self.types().contains(&entry_type)
    }

    /// Match a model-supplied label against the members, ignoring case,
    /// surrounding whitespace, brackets and quotes.
    pub fn parse(self, raw: &str) -> Option<EntryType> {
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'' | '*' | '.'))
            .trim();
        self.types()
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(cleaned))
    }

    /// Catch-all member used when nothing more specific applies.
    pub fn catch_all(self) -> EntryType {
        EntryType::Insight
    }
}

// ── Confidence ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Display form used by the sinks ("High", "Medium", "Low").
    pub fn capitalized(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Whether a payload at this level also goes to the alert channel.
    pub fn needs_review(self) -> bool {
        !matches!(self, Self::High)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Classification ───────────────────────────────────────────────

/// Type and tags for one unit of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub entry_type: EntryType,
    pub tags: Vec<String>,
}

/// Collapse a tag list to `["General"]` when fewer than two remain.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    if tags.len() >= 2 {
        tags
    } else {
        vec![SENTINEL_TAG.to_string()]
    }
}

// ── Distillation ─────────────────────────────────────────────────

/// Structured record distilled from one unit of raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distillation {
    pub summary: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub tags: Vec<String>,
    pub confidence: Confidence,
    pub confidence_note: Option<String>,
}

impl Distillation {
    /// Assemble a record, dropping the note at high confidence and
    /// collapsing short tag lists.
    pub fn new(
        summary: String,
        classification: Classification,
        confidence: Confidence,
        confidence_note: Option<String>,
    ) -> Self {
        let confidence_note = match confidence {
            Confidence::High => None,
            _ => confidence_note.filter(|n| !n.trim().is_empty()),
        };
        Self {
            summary,
            entry_type: classification.entry_type,
            tags: normalize_tags(classification.tags),
            confidence,
            confidence_note,
        }
    }
}
