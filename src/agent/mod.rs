//! Interactive mode: one block of text in, one routed record per thought.

pub mod pipeline;

pub use pipeline::{Agent, AgentReport, EntryReport};
