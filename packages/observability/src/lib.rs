//! # Observability
//!
//! Centralized logging for the expense tracker workspace.
//!
//! Binaries call [`init_with_config`] once at startup and every crate logs
//! with the standard `tracing` macros. Crates have no knowledge of where log
//! lines end up.
//!
//! ## Dev Mode
//!
//! With the `dev` feature (on by default) every service appends structured
//! JSONL to `~/.expense-tracker/logs/dev.jsonl`:
//!
//! - `tail -f ~/.expense-tracker/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.expense-tracker/logs/dev.jsonl` for interactive exploration
//!
//! ## Remote export
//!
//! When a PostHog key is configured, WARN and ERROR entries are also batched
//! to PostHog on a background thread. Sensitive fields (tokens, cookies,
//! authorization headers) are redacted before they leave the process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "desktop-shell".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! tracing::info!("ready");
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;
mod remote;

use std::path::PathBuf;

pub use json_layer::LogEntry;

/// Runtime export policy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObservabilityMode {
    /// Development mode: include verbose payloads after secret redaction.
    #[default]
    DevVerbose,
    /// Production mode: export metadata only (no raw messages or fields).
    ProdMetadataOnly,
}

/// PostHog sink configuration.
#[derive(Debug, Clone)]
pub struct PosthogConfig {
    /// Project API key.
    pub api_key: String,
    /// PostHog ingest host, e.g. https://us.i.posthog.com.
    pub host: String,
    /// Max events per batch flush.
    pub batch_size: usize,
    /// Internal queue capacity.
    pub queue_capacity: usize,
    /// Flush interval in milliseconds.
    pub flush_interval_ms: u64,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "desktop-shell").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.expense-tracker/logs/dev.jsonl` in dev mode.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,

    /// Runtime observability mode.
    pub mode: ObservabilityMode,

    /// Logical environment name written to remote payloads.
    pub environment: String,

    /// Optional PostHog sink configuration.
    pub posthog: Option<PosthogConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            mode: ObservabilityMode::DevVerbose,
            environment: "development".into(),
            posthog: None,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Calling this more than once keeps the first subscriber.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        dev::init_dev_subscriber(&config);
    }

    #[cfg(not(feature = "dev"))]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
            )
            .with_target(true)
            .compact()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
        assert_eq!(config.mode, ObservabilityMode::DevVerbose);
        assert_eq!(config.environment, "development");
        assert!(config.posthog.is_none());
    }
}
