//! Local multi-thought heuristic.
//!
//! Cheap, deterministic pre-filter deciding whether the split decision call
//! is worth paying for. It never makes the final call on its own.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Texts shorter than this (in characters) are never analysed.
pub const MIN_ANALYSIS_CHARS: usize = 100;

const LONG_SENTENCE_CHARS: usize = 120;
const LONG_SENTENCE_THRESHOLD: usize = 2;
const CONJUNCTION_THRESHOLD: usize = 5;
const CLAUSE_THRESHOLD: usize = 8;

/// Topic-shift cues that usually mean two ideas share one entry.
const THEMATIC_PATTERNS: &[&str] = &[
    r"(?i)research.*(brisket|favorite)",
    r"(?i)dedicated.*(passion|hours)",
    r"(?i)likes?.*also",
    r"(?i)tool.*routine",
    r"(?i)enjoy.*separately",
    r"(?i)habit.*setup",
    r"(?i)dream.*plan",
    r"(?i)multiple.*reasons",
    r"(?i)my (goal|plan).*also",
    r"(?i)two.*(ideas|thoughts|preferences)",
];

fn conjunction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(and|but|or|so|because|while|although|though|even though)\b")
            .expect("static regex")
    })
}

fn clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(and|but|so|because)\b").expect("static regex"))
}

/// Pieces left after splitting on the clause conjunctions, counting each
/// conjunction as a piece of its own: `k` matches give `2k + 1`.
fn clause_count(text: &str) -> usize {
    2 * clause_re().find_iter(text).count() + 1
}

fn thematic_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        THEMATIC_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("static regex"))
            .collect()
    })
}

// ── Signals ──────────────────────────────────────────────────────

/// Raw measurements behind a heuristic verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeuristicSignals {
    pub chars: usize,
    pub sentences: usize,
    pub conjunctions: usize,
    pub clauses: usize,
    pub long_sentences: usize,
    pub thematic_match: bool,
}

impl HeuristicSignals {
    /// Measure a text. Pure; no I/O.
    pub fn measure(text: &str) -> Self {
        let sentences: Vec<&str> = text
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            chars: text.chars().count(),
            sentences: sentences.len(),
            conjunctions: conjunction_re().find_iter(text).count(),
            clauses: clause_count(text),
            long_sentences: sentences
                .iter()
                .filter(|s| s.chars().count() > LONG_SENTENCE_CHARS)
                .count(),
            thematic_match: thematic_res().iter().any(|re| re.is_match(text)),
        }
    }

    /// Whether these measurements suggest more than one thought.
    pub fn suggests_split(&self) -> bool {
        if self.chars < MIN_ANALYSIS_CHARS {
            return false;
        }
        self.long_sentences >= LONG_SENTENCE_THRESHOLD
            || self.conjunctions >= CONJUNCTION_THRESHOLD
            || self.clauses > CLAUSE_THRESHOLD
            || self.thematic_match
    }
}

/// `true` when the text might hold several independent thoughts.
pub fn might_contain_multiple(text: &str) -> bool {
    if text.chars().count() < MIN_ANALYSIS_CHARS {
        return false;
    }
    HeuristicSignals::measure(text).suggests_split()
}
