//! Classified error taxonomy.
//!
//! Business logic builds a [`DomainError`] when it detects an anticipated
//! failure (missing resource, bad input). Anything else travels as
//! [`ServiceError::Unexpected`] and is rendered opaquely at the boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error used for causes and unclassified failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured metadata attached to a classified error (e.g. the invalid field).
pub type Details = BTreeMap<String, serde_json::Value>;

/// Closed set of classified failure codes.
///
/// Adding a member is the only way to extend the taxonomy. The HTTP status
/// table matches exhaustively, so a new member must be given a status there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Requested entity is absent.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// A caller-supplied value failed a precondition.
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Server-side fault with a known cause.
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorCode {
    /// Wire name of the code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Message used when a caller builds an error with an empty message.
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::NotFound => "resource not found",
            Self::InvalidInput => "invalid input",
            Self::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure explicitly tagged with a code, a message and structured details.
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    details: Details,
    #[source]
    cause: Option<BoxError>,
}

impl DomainError {
    /// Build a classified error. Never fails; an empty message is replaced
    /// by the code's default message.
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        details: Details,
        cause: Option<BoxError>,
    ) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = code.default_message().to_string();
        }

        Self {
            code,
            message,
            details,
            cause,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message, Details::new(), None)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message, Details::new(), None)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message, Details::new(), None)
    }

    /// Attach one detail entry while the error is being built.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attach the underlying cause while the error is being built.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

/// Any error a use case can hand to the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Anticipated failure with surfaced code, message and details.
    #[error(transparent)]
    Classified(#[from] DomainError),

    /// Everything else. Its text never leaves the process.
    #[error("unexpected failure")]
    Unexpected(#[source] BoxError),
}

impl ServiceError {
    pub fn unexpected(err: impl Into<BoxError>) -> Self {
        Self::Unexpected(err.into())
    }

    /// The classified error, if this is one.
    pub fn as_classified(&self) -> Option<&DomainError> {
        match self {
            Self::Classified(err) => Some(err),
            Self::Unexpected(_) => None,
        }
    }
}
