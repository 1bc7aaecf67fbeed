//! Logging initialisation primitives and configuration.
//!
//! # Design
//! - Centralises logging setup (fmt or JSON) with a single entry point.
//! - `RUST_LOG` takes precedence over the configured level when present.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default logging target when `RUST_LOG` is not provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configure and install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.with_target)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(build_env_filter(config.level))
            .with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_thread_ids(false),
            )
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Log level string (e.g., `info`, `debug`, `tidings_events=trace`).
    pub level: &'a str,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Whether records carry their module target.
    pub with_target: bool,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            with_target: false,
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    fn parse(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::infer(),
        }
    }
}

impl<'a> LoggingConfig<'a> {
    /// Build a configuration from a JSON settings map.
    ///
    /// Reads `log_level` (string), `log_format` (`"json"` or `"pretty"`) and
    /// `log_target` (bool). Missing or mistyped keys keep their defaults, and an
    /// unrecognised format falls back to [`LogFormat::infer`].
    #[must_use]
    pub fn from_json(settings: &'a serde_json::Value) -> Self {
        let defaults = Self::default();
        Self {
            level: settings
                .get("log_level")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(defaults.level),
            format: settings
                .get("log_format")
                .and_then(serde_json::Value::as_str)
                .map_or(defaults.format, LogFormat::parse),
            with_target: settings
                .get("log_target")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(defaults.with_target),
        }
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
