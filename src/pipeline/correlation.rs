//! Per-call start stamps and elapsed-time readback.

use std::time::Instant;

use crate::pipeline::record::Elapsed;
use crate::transport::CallConfig;

/// Record "now" as the call's start under `namespace`.
///
/// Other fields under the namespace are kept. Stamping again, as on a
/// retried call, moves the start forward.
pub fn stamp(mut config: CallConfig, namespace: &str) -> CallConfig {
    config.marker_mut(namespace).started_at = Some(Instant::now());
    config
}

/// Time since the stamp under `namespace`, or [`Elapsed::Unknown`] when the
/// call was never stamped.
pub fn elapsed(config: Option<&CallConfig>, namespace: &str, completed_at: Instant) -> Elapsed {
    match config.and_then(|c| c.marker(namespace)).and_then(|m| m.started_at) {
        Some(started_at) => {
            let millis = completed_at.saturating_duration_since(started_at).as_millis();
            Elapsed::Millis(u64::try_from(millis).unwrap_or(u64::MAX))
        }
        None => Elapsed::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;

    #[test]
    fn test_stamp_then_elapsed() {
        let config = stamp(CallConfig::get("/"), "ns");
        let later = Instant::now() + Duration::from_millis(25);
        assert!(matches!(elapsed(Some(&config), "ns", later), Elapsed::Millis(ms) if ms >= 25));
    }

    #[test]
    fn test_missing_marker_is_unknown() {
        let config = CallConfig::get("/");
        assert_eq!(elapsed(Some(&config), "ns", Instant::now()), Elapsed::Unknown);
        assert_eq!(elapsed(None, "ns", Instant::now()), Elapsed::Unknown);

        let config = stamp(config, "other");
        assert_eq!(elapsed(Some(&config), "ns", Instant::now()), Elapsed::Unknown);
    }

    #[test]
    fn test_restamp_keeps_attributes_and_moves_start() {
        let mut config = CallConfig::get("/");
        config
            .marker_mut("ns")
            .attributes
            .insert("attempt".into(), Value::from(1));
        let config = stamp(config, "ns");
        let first = config.marker("ns").unwrap().started_at.unwrap();

        std::thread::sleep(Duration::from_millis(2));
        let config = stamp(config, "ns");
        let marker = config.marker("ns").unwrap();
        assert!(marker.started_at.unwrap() > first);
        assert_eq!(marker.attributes["attempt"], 1);
    }
}
