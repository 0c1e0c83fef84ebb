//! Application use cases.
//!
//! Use cases hold business rules, emit telemetry through the
//! [`Telemetry`](crate::observability::Telemetry) capabilities and return
//! [`ServiceError`](crate::domain::ServiceError) to the HTTP boundary
//! without logging it.

pub mod user;

pub use user::UserUseCase;
