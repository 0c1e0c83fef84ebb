//! User lookup.

use std::time::Instant;

use crate::domain::{DomainError, ServiceError};
use crate::observability::metrics::{USECASE_CALLS_TOTAL, USER_FETCH_DURATION_SECONDS};
use crate::observability::{in_span, Context, KeyValue, Telemetry};

/// The only user the example store knows about.
pub const EXAMPLE_USER_ID: &str = "123";
pub const EXAMPLE_USER: &str = "Usuário de exemplo";

/// Id that simulates an infrastructure fault.
pub const FAULTY_USER_ID: &str = "500";

/// Looks users up by id.
#[derive(Debug, Clone)]
pub struct UserUseCase {
    telemetry: Telemetry,
}

impl UserUseCase {
    pub fn new(telemetry: Telemetry) -> Self {
        Self { telemetry }
    }

    /// Resolve `id` to a user.
    ///
    /// - `""` is classified `InvalidInput` with `details.field = "id"`
    /// - `"500"` fails with an unclassified error
    /// - `"123"` succeeds
    /// - anything else is classified `NotFound` with `details.id`
    pub fn get_user_by_id(&self, cx: &Context, id: &str) -> Result<String, ServiceError> {
        let start = Instant::now();

        let result = in_span(self.telemetry.tracer(), cx, "user_usecase.get_user_by_id", |cx| {
            self.telemetry
                .logger()
                .info(cx, "Looking up user", &[KeyValue::new("user.id", id)]);
            lookup(id)
        });

        let outcome = [KeyValue::new("outcome", outcome_label(&result))];
        let metrics = self.telemetry.metrics();
        metrics.add_counter(cx, USECASE_CALLS_TOTAL, 1, &outcome);
        metrics.record_histogram(
            cx,
            USER_FETCH_DURATION_SECONDS,
            start.elapsed().as_secs_f64(),
            &outcome,
        );

        result
    }
}

fn lookup(id: &str) -> Result<String, ServiceError> {
    if id.is_empty() {
        return Err(DomainError::invalid_input("user id must not be empty")
            .with_detail("field", "id")
            .into());
    }

    if id == FAULTY_USER_ID {
        return Err(ServiceError::unexpected("user store connection reset"));
    }

    if id != EXAMPLE_USER_ID {
        return Err(DomainError::not_found("user not found")
            .with_detail("id", id)
            .with_source("no row for id in user store")
            .into());
    }

    Ok(EXAMPLE_USER.to_string())
}

fn outcome_label(result: &Result<String, ServiceError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(ServiceError::Classified(err)) => err.code().as_str(),
        Err(ServiceError::Unexpected(_)) => "unexpected",
    }
}
