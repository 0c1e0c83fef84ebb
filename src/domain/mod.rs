//! Domain layer.
//!
//! # Responsibilities
//! - Define the closed set of classified failure codes
//! - Carry structured details for anticipated failures
//! - Separate classified failures from unexpected ones at the type level
//!
//! # Design Decisions
//! - Classified errors are immutable once built
//! - Causes are kept for diagnostics only; the HTTP boundary never renders them

pub mod error;

pub use error::{Details, DomainError, ErrorCode, ServiceError};
