//! Event bus error primitives.
//!
//! Publishing and subscribing never fail; errors only arise while building a
//! bus configuration.

use thiserror::Error;

/// Error raised while loading or validating a bus configuration.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// A configuration field held an unusable value.
    #[error("invalid event bus configuration")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The configuration document could not be parsed.
    #[error("failed to parse event bus configuration")]
    ConfigParse {
        /// Underlying serde error.
        source: serde_json::Error,
    },
}

impl EventBusError {
    /// Field associated with a validation failure, when applicable.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig { field, .. } => Some(*field),
            Self::ConfigParse { .. } => None,
        }
    }
}

/// Result wrapper for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;
