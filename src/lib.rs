//! Thought distillation engine.
//!
//! Free-form notes are checked for multiple thoughts, split, summarized,
//! classified and routed to a document store and notification webhooks.
//! A queue mode drains pending notes from a Supabase table.

pub mod agent;
pub mod config;
pub mod distill;
pub mod gatekeeper;
pub mod integrations;
pub mod llm;
pub mod queue;
pub mod routing;
