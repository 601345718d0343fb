//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! LoggerConfig (built in code or deserialized by the host)
//!     → validation.rs (semantic checks)
//!     → attach (validated, immutable)
//!     → shared via Arc by every instance the binding covers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once attached; re-attach to change it
//! - All fields have defaults to allow minimal configs
//! - No files or environment variables; the host passes everything in

pub mod schema;
pub mod validation;

pub use schema::LoggerConfig;
pub use validation::{validate_config, ValidationError};
