//! Response envelopes.
//!
//! Success bodies are `{"data": ...}`; failures are
//! `{"error": {"code", "message", "details"?}}`.

use serde::{Deserialize, Serialize};

use crate::domain::Details;

/// Success envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Present for classified errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}
