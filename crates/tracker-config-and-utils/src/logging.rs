//! Logging initialization for the desktop shell.
//!
//! Everything funnels through the observability crate, which writes structured
//! JSONL to `~/.expense-tracker/logs/dev.jsonl` and, when a PostHog key is
//! configured, exports WARN and ERROR entries.

use crate::{Config, Paths};
use observability::{LogConfig, ObservabilityMode, PosthogConfig};

const SERVICE_NAME: &str = "desktop-shell";

/// Initialize the logging system.
///
/// `EXPENSE_OBS_MODE=prod` switches remote export to metadata only.
///
/// ```ignore
/// init_logging(&config, &paths);
/// tracing::info!("Shell started");
/// ```
pub fn init_logging(config: &Config, paths: &Paths) {
    let mode = std::env::var("EXPENSE_OBS_MODE").ok();
    observability::init_with_config(log_config(config, paths, mode.as_deref()));
}

fn log_config(config: &Config, paths: &Paths, mode: Option<&str>) -> LogConfig {
    let mode = match mode.map(str::to_ascii_lowercase).as_deref() {
        Some("prod") | Some("production") => ObservabilityMode::ProdMetadataOnly,
        _ => ObservabilityMode::DevVerbose,
    };
    let environment = match mode {
        ObservabilityMode::ProdMetadataOnly => "production",
        ObservabilityMode::DevVerbose => "development",
    };

    let posthog = config
        .posthog_api_key
        .clone()
        .and_then(non_empty)
        .map(|api_key| PosthogConfig {
            api_key,
            host: config.posthog_host.clone(),
            batch_size: 50,
            queue_capacity: 2_000,
            flush_interval_ms: 2_000,
        });

    LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(&config.log_level).as_str().to_ascii_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
        mode,
        environment: environment.into(),
        posthog,
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
