//! Completion service abstraction.
//!
//! Every LLM-backed stage talks to the model through [`CompletionService`].
//! Stages never see transport details: they build a [`CompletionRequest`],
//! await one reply, and treat any [`CompletionError`] as "take the fallback".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Model tier ───────────────────────────────────────────────────

/// Which class of model a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Cheap, low-latency model for binary gates.
    Fast,
    /// Higher-quality model for summarizing, splitting and classifying.
    Quality,
}

impl ModelTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Quality => "quality",
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub tier: ModelTier,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

impl CompletionRequest {
    /// Single user-message request, the shape every stage prompt uses.
    pub fn user_prompt(tier: ModelTier, prompt: impl Into<String>, temperature: f64) -> Self {
        Self {
            tier,
            messages: vec![ChatMessage::user(prompt)],
            temperature,
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion service returned an empty reply")]
    EmptyReply,

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("completion service not configured: {0}")]
    NotConfigured(String),
}

// ── Service trait ────────────────────────────────────────────────

/// A language-model completion backend.
///
/// Implementations return the reply text, already trimmed and non-empty.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Backend identifier for logs (e.g. "openai").
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}
