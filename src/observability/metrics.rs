//! Metrics collection.
//!
//! # Metrics
//! - `call_logger_records_total` (counter): records persisted, by outcome
//! - `call_logger_sink_failures_total` (counter): inserts the sink rejected
//! - `call_logger_call_duration_seconds` (histogram): elapsed time of logged calls
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; no-ops until the host installs a recorder
//! - Duration is only observed when the call carried a start marker

pub fn record_persisted(outcome: &'static str) {
    ::metrics::counter!("call_logger_records_total", "outcome" => outcome).increment(1);
}

pub fn record_sink_failure() {
    ::metrics::counter!("call_logger_sink_failures_total").increment(1);
}

pub fn record_call_duration(millis: u64) {
    ::metrics::histogram!("call_logger_call_duration_seconds").record(millis as f64 / 1000.0);
}
