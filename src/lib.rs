//! User lookup service.
//!
//! A single `GET /users/{id}` endpoint built from four layers:
//!
//! ```text
//!   HTTP request
//!       │
//!       ▼
//!   http::handlers ──── span, request metrics
//!       │
//!       ▼
//!   usecase::user ───── span, counter, histogram, log line
//!       │
//!       ├── Ok(user) ───────────────► 200 {"data": ...}
//!       └── Err(ServiceError)
//!               │
//!               ▼
//!   http::error ─────── logged once, translated to status + envelope
//!
//!   observability ───── Tracer / Metrics / Logger traits, real or no-op
//! ```

pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod usecase;

pub use config::ServiceConfig;
pub use domain::{DomainError, ErrorCode, ServiceError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;
