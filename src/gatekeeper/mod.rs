//! Split gatekeeper.
//!
//! Decides whether an entry is worth sending through the splitter:
//! - A local, deterministic heuristic filters out the obvious single thoughts
//! - Only survivors are put to the fast model as a yes/no question
//! - Any failure keeps the entry whole

pub mod heuristic;
pub mod split_decision;

pub use heuristic::{might_contain_multiple, HeuristicSignals, MIN_ANALYSIS_CHARS};
pub use split_decision::{SplitGate, SplitVerdict};
