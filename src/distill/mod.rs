//! Thought distillation.
//!
//! Every LLM-backed stage here has a deterministic twin and falls through
//! to it on any completion failure:
//!
//! | Stage        | Model path                 | Fallback                     |
//! |--------------|----------------------------|------------------------------|
//! | Splitter     | line-delimited entries     | [`fallback_split`]           |
//! | Classifier   | `Type:` / `Tags:` reply    | [`fallback_type`] + General  |
//! | Distiller    | JSON summary + confidence  | raw text + hedge estimate    |

pub mod classifier;
pub mod confidence;
pub mod distiller;
pub mod splitter;
pub mod types;

pub use classifier::{fallback_type, fallback_type_in, Classifier};
pub use distiller::Distiller;
pub use splitter::{fallback_split, Splitter};
pub use types::{
    Classification, Confidence, Distillation, EntryType, Vocabulary, SENTINEL_TAG,
};
