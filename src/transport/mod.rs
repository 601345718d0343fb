//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! CallConfig (per call) + ClientDefaults (per instance)
//!     → request interceptors (registration order)
//!     → RequestHandle built from the merged config
//!     → reqwest dispatch
//!     → CallResponse (2xx) or CallError (everything else)
//!     → response interceptors (on_response / on_error)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - Interceptor chains are per instance; derived instances start empty
//! - Non-2xx statuses are failures, so loggers see them on the error path
//! - Derivation goes through a replaceable hook so wrappers compose

pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod response;

pub use client::{DeriveHook, HttpClient};
pub use config::{CallConfig, CallMarker, ClientDefaults};
pub use error::{CallError, CallErrorKind};
pub use interceptor::{Interceptable, RequestInterceptor, ResponseInterceptor};
pub use response::{CallResponse, RequestHandle};
