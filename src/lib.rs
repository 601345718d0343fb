//! HTTP call logger.
//!
//! Attaches to an [`HttpClient`]'s interceptor chain and persists one
//! structured record per call (request, response or error, timing) into a
//! document sink.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──▶ HttpClient::request
//!                 │
//!                 ├─ request interceptors ── StampStep (start time under namespace)
//!                 │
//!                 ├─ reqwest dispatch ──────────────────────────▶ remote server
//!                 │
//!                 └─ response interceptors ─ RecordStep
//!                                              ├─ RecordBuilder (normalize, decode, transform)
//!                                              └─ Collection::insert_one ──▶ sink
//!   caller ◀── same response, or same error + record id
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use call_logger::{attach, HttpClient, LoggerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = HttpClient::new();
//! attach(&mut client, LoggerConfig::new("file:///var/log/calls", "logs")).await?;
//! client.get("https://www.example.com/path").await?;
//! # Ok(())
//! # }
//! ```

// Core pipeline
pub mod pipeline;
pub mod transport;

// Collaborators
pub mod sink;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::LoggerConfig;
pub use pipeline::{attach, attach_with, AttachError, Binding, LogRecord};
pub use sink::{DefaultConnector, RecordId};
pub use transport::{CallConfig, CallError, CallResponse, ClientDefaults, HttpClient};
