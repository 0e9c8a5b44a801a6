//! Language-model completion service.
//!
//! [`CompletionService`] is the only seam between the pipeline and a model
//! backend. [`OpenAiClient`] is the production implementation; tests swap in
//! scripted fakes.

pub mod openai;
pub mod traits;

pub use openai::OpenAiClient;
pub use traits::{
    ChatMessage, CompletionError, CompletionRequest, CompletionService, ModelTier, Role,
};
