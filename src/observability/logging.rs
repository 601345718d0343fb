//! Structured logging.
//!
//! # Responsibilities
//! - Initialize a tracing subscriber for hosts that do not bring their own
//! - Honor `RUST_LOG`, falling back to a caller-supplied filter

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG` or `default_filter`.
///
/// Returns false when a global subscriber was already set.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
