//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, trace context from `traceparent`)
//!     → handlers.rs (span, use case call)
//!     → error.rs (ServiceError → status + envelope, logged once)
//!     → response.rs (envelopes)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use error::{report, translate};
pub use request::{MakeRequestUuidV4, RequestContext, X_REQUEST_ID};
pub use response::{DataEnvelope, ErrorBody, ErrorEnvelope};
pub use server::{build_router, AppState, HttpServer};
