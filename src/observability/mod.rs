//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline produces:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host installs
//! ```
//!
//! # Design Decisions
//! - The crate never installs a metrics recorder; hosts choose the exporter
//! - Sink failures surface here instead of on the caller's result

pub mod logging;
pub mod metrics;
