//! Boundary translation from [`ServiceError`] to HTTP responses.
//!
//! # Responsibilities
//! - Map every error to exactly one status and envelope
//! - Surface code, message and details of classified errors
//! - Hide everything about unexpected errors behind a generic body
//! - Log each failed request once
//!
//! # Design Decisions
//! - `translate` is pure; `report` is the only place request failures are logged
//! - Causes are logged, never rendered

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::{ErrorCode, ServiceError};
use crate::http::response::{ErrorBody, ErrorEnvelope};
use crate::observability::logging::error_chain;
use crate::observability::{Context, KeyValue, Logger};

/// Message returned for every unclassified failure.
pub const UNEXPECTED_MESSAGE: &str = "unexpected error";

/// Status for a classified error code.
///
/// The match is exhaustive, so a new [`ErrorCode`] member does not compile
/// until it is given a status here.
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an error to its wire representation.
pub fn translate(err: &ServiceError) -> (StatusCode, ErrorEnvelope) {
    match err {
        ServiceError::Classified(err) => (
            status_for(err.code()),
            ErrorEnvelope {
                error: ErrorBody {
                    code: err.code().as_str().to_string(),
                    message: err.message().to_string(),
                    details: Some(err.details().clone()),
                },
            },
        ),
        ServiceError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope {
                error: ErrorBody {
                    code: ErrorCode::Internal.as_str().to_string(),
                    message: UNEXPECTED_MESSAGE.to_string(),
                    details: None,
                },
            },
        ),
    }
}

/// Log a failed request: classified at `warn`, unexpected at `error` with
/// its full cause chain.
pub fn report(logger: &dyn Logger, cx: &Context, err: &ServiceError) {
    match err {
        ServiceError::Classified(classified) => {
            let mut fields = vec![KeyValue::new("error.code", classified.code().as_str())];
            if let Some(cause) = classified.cause() {
                fields.push(KeyValue::new("error.cause", error_chain(cause)));
            }
            logger.warn(cx, classified.message(), &fields);
        }
        ServiceError::Unexpected(_) => {
            logger.error(cx, err, "request failed", &[]);
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = translate(&self);
        (status, Json(body)).into_response()
    }
}
