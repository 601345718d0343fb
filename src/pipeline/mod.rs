//! Interception-and-normalization pipeline.
//!
//! # Data Flow
//! ```text
//! outgoing call
//!     → correlation.rs (stamp start time under the binding's namespace)
//!     → [transport dispatch]
//!     → record.rs (assemble record)
//!         ← normalize.rs (lowercase headers, merged query)
//!         ← codec.rs (decode bodies)
//!         ← transform.rs (optional user hooks)
//!         ← correlation.rs (elapsed time)
//!     → sink (insert_one)
//!     → caller: same response, or same error plus record id
//! ```

pub mod binder;
pub mod codec;
pub mod correlation;
pub mod normalize;
pub mod record;
pub mod transform;

pub use binder::{attach, attach_with, AttachError, Binding};
pub use record::{Elapsed, LogRecord, RecordBuilder, RequestPart, ResponsePart};
pub use transform::{RequestContext, ResponseContext, Transforms};
