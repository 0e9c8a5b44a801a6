use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::distill::Distillation;

/// A distillation plus provenance, handed to every sink.
///
/// Built once per distillation and only ever lent out by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingPayload {
    #[serde(flatten)]
    pub distillation: Distillation,
    pub raw_input: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl RoutingPayload {
    pub fn new(distillation: Distillation, raw_input: impl Into<String>, source: impl Into<String>) -> Self {
        Self::at(distillation, raw_input, source, Utc::now())
    }

    pub fn at(
        distillation: Distillation,
        raw_input: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            distillation,
            raw_input: raw_input.into(),
            source: source.into(),
            timestamp,
        }
    }

    /// Record title; the summary doubles as the title.
    pub fn title(&self) -> &str {
        &self.distillation.summary
    }

    /// ISO-8601 timestamp for the document store.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}
