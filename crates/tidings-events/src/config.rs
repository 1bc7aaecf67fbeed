//! Bus configuration.
//!
//! Hosts either build a [`BusConfig`] in code or load it from a JSON document
//! of the form `{"throttle_window_ms": 200, "fault_policy": "isolate"}`, where
//! both keys are optional.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EventBusError, EventBusResult};
use crate::throttle::DEFAULT_THROTTLE_WINDOW;

/// How dispatch reacts to a subscriber that panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Let the panic unwind to the publisher; remaining callbacks are skipped.
    #[default]
    Propagate,
    /// Catch the panic, log it, and continue with the next callback.
    Isolate,
}

/// Runtime settings for a [`Bus`](crate::Bus).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Window inside which a repeated rate-limited ID is dropped.
    ///
    /// Defaults to the fixed 200 ms used by [`Bus::new`](crate::Bus::new);
    /// overriding it is a host decision, not something the bus needs.
    pub throttle_window: Duration,
    /// Panic handling for subscriber callbacks.
    pub fault_policy: FaultPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBusConfig {
    #[serde(default)]
    throttle_window_ms: Option<u64>,
    #[serde(default)]
    fault_policy: Option<FaultPolicy>,
}

impl BusConfig {
    /// Replace the throttle window.
    #[must_use]
    pub const fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    /// Replace the fault policy.
    #[must_use]
    pub const fn with_fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Check that the configuration can drive a bus.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::InvalidConfig`] when the throttle window is zero.
    pub const fn validate(&self) -> EventBusResult<()> {
        if self.throttle_window.is_zero() {
            return Err(EventBusError::InvalidConfig {
                field: "throttle_window_ms",
                reason: "must_be_positive",
            });
        }
        Ok(())
    }

    /// Load a configuration from a parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConfigParse`] for malformed or unknown keys and
    /// [`EventBusError::InvalidConfig`] when validation fails.
    pub fn from_json(value: &serde_json::Value) -> EventBusResult<Self> {
        let raw = RawBusConfig::deserialize(value)
            .map_err(|source| EventBusError::ConfigParse { source })?;
        Self::from_raw(raw)
    }

    /// Load a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`BusConfig::from_json`], plus syntax errors in `text`.
    pub fn from_json_str(text: &str) -> EventBusResult<Self> {
        let raw = serde_json::from_str::<RawBusConfig>(text)
            .map_err(|source| EventBusError::ConfigParse { source })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawBusConfig) -> EventBusResult<Self> {
        let defaults = Self::default();
        let config = Self {
            throttle_window: raw
                .throttle_window_ms
                .map_or(defaults.throttle_window, Duration::from_millis),
            fault_policy: raw.fault_policy.unwrap_or(defaults.fault_policy),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            throttle_window: DEFAULT_THROTTLE_WINDOW,
            fault_policy: FaultPolicy::Propagate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_the_fixed_core() {
        let config = BusConfig::default();
        assert_eq!(config.throttle_window, Duration::from_millis(200));
        assert_eq!(config.fault_policy, FaultPolicy::Propagate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() -> Result<(), EventBusError> {
        assert_eq!(BusConfig::from_json(&json!({}))?, BusConfig::default());
        assert_eq!(BusConfig::from_json_str("{}")?, BusConfig::default());
        Ok(())
    }

    #[test]
    fn document_overrides_are_applied() -> Result<(), EventBusError> {
        let config = BusConfig::from_json(&json!({
            "throttle_window_ms": 50,
            "fault_policy": "isolate"
        }))?;
        assert_eq!(config.throttle_window, Duration::from_millis(50));
        assert_eq!(config.fault_policy, FaultPolicy::Isolate);
        Ok(())
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = BusConfig::from_json(&json!({"throttle_window_ms": 0}))
            .expect_err("zero window must fail validation");
        assert_eq!(err.field(), Some("throttle_window_ms"));

        let built = BusConfig::default().with_throttle_window(Duration::ZERO);
        assert!(built.validate().is_err());
    }

    #[test]
    fn malformed_documents_are_parse_errors() {
        for text in [
            r#"{"throttle_window_ms": "fast"}"#,
            r#"{"fault_policy": "ignore"}"#,
            r#"{"window": 10}"#,
            "[",
        ] {
            let err = BusConfig::from_json_str(text).expect_err("document must be rejected");
            assert!(matches!(err, EventBusError::ConfigParse { .. }), "{text}");
        }
    }

    #[test]
    fn builders_replace_single_fields() {
        let config = BusConfig::default()
            .with_fault_policy(FaultPolicy::Isolate)
            .with_throttle_window(Duration::from_secs(1));
        assert_eq!(config.fault_policy, FaultPolicy::Isolate);
        assert_eq!(config.throttle_window, Duration::from_secs(1));
    }
}
