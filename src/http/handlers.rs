//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::{DomainError, ServiceError};
use crate::http::error;
use crate::http::request::{inject_trace_context, RequestContext};
use crate::http::response::DataEnvelope;
use crate::http::server::AppState;
use crate::observability::{metrics, Context, KeyValue, SpanStatus};

pub const USERS_ROUTE: &str = "/users/{id}";

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    RequestContext(cx): RequestContext,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    match id {
        Ok(Path(id)) => lookup_user(&state, &cx, |cx| state.users.get_user_by_id(cx, &id)),
        Err(rejection) => lookup_user(&state, &cx, |_| Err(invalid_path_id(rejection))),
    }
}

/// `GET /users/`: same lookup with an empty id.
pub async fn get_user_without_id(
    State(state): State<AppState>,
    RequestContext(cx): RequestContext,
) -> Response {
    lookup_user(&state, &cx, |cx| state.users.get_user_by_id(cx, ""))
}

/// An id segment axum could not decode (e.g. invalid UTF-8).
fn invalid_path_id(rejection: PathRejection) -> ServiceError {
    DomainError::invalid_input("user id is not a valid path segment")
        .with_detail("field", "id")
        .with_source(rejection)
        .into()
}

fn lookup_user<F>(state: &AppState, cx: &Context, lookup: F) -> Response
where
    F: FnOnce(&Context) -> Result<String, ServiceError>,
{
    let start = Instant::now();
    let telemetry = &state.telemetry;

    let (cx, mut span) = telemetry.tracer().start_span(
        cx,
        "GET /users/{id}",
        &[
            KeyValue::new("http.request.method", "GET"),
            KeyValue::new("http.route", USERS_ROUTE),
        ],
    );

    let mut response = match lookup(&cx) {
        Ok(user) => (StatusCode::OK, Json(DataEnvelope::new(user))).into_response(),
        Err(err) => {
            error::report(telemetry.logger(), &cx, &err);
            err.into_response()
        }
    };
    inject_trace_context(&cx, response.headers_mut());

    let status = response.status();
    span.set_attributes(&[KeyValue::new("http.response.status_code", status.as_u16())]);
    // Client errors leave a server span unset.
    span.set_status(if status.is_server_error() {
        SpanStatus::error(status.to_string())
    } else if status.is_success() {
        SpanStatus::Ok
    } else {
        SpanStatus::Unset
    });

    metrics::record_request(
        telemetry.metrics(),
        &cx,
        Method::GET.as_str(),
        USERS_ROUTE,
        status.as_u16(),
        start,
    );

    response
}
