//! Configuration management for the desktop shell.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default backend URL (can be overridden at compile time via EXPENSE_API_URL env var).
pub const DEFAULT_API_URL: &str = match option_env!("EXPENSE_API_URL") {
    Some(url) => url,
    None => "http://localhost:5000",
};

/// Path on the backend that starts the Google OAuth dance, relative to `api_url`.
pub const GOOGLE_AUTH_PATH: &str = "auth/google";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default port for the local OAuth callback listener.
pub const DEFAULT_OAUTH_CALLBACK_PORT: u16 = 9876;

/// Default time to wait for the OAuth redirect, in seconds.
pub const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 120;

/// Default PostHog ingest host.
pub const DEFAULT_POSTHOG_HOST: &str = "https://us.i.posthog.com";

/// Desktop shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend base URL hosting the auth endpoints.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Port of the local OAuth callback listener.
    #[serde(default = "default_oauth_callback_port")]
    pub oauth_callback_port: u16,
    /// Seconds to wait for the OAuth redirect.
    #[serde(default = "default_oauth_timeout_secs")]
    pub oauth_timeout_secs: u64,
    /// PostHog project key for analytics and remote error export.
    #[serde(default = "default_posthog_api_key")]
    pub posthog_api_key: Option<String>,
    /// PostHog ingest host.
    #[serde(default = "default_posthog_host")]
    pub posthog_host: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_oauth_callback_port() -> u16 {
    DEFAULT_OAUTH_CALLBACK_PORT
}

fn default_oauth_timeout_secs() -> u64 {
    DEFAULT_OAUTH_TIMEOUT_SECS
}

fn default_posthog_api_key() -> Option<String> {
    option_env!("EXPENSE_POSTHOG_API_KEY").map(|s| s.to_string())
}

fn default_posthog_host() -> String {
    DEFAULT_POSTHOG_HOST.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_url: default_api_url(),
            oauth_callback_port: DEFAULT_OAUTH_CALLBACK_PORT,
            oauth_timeout_secs: DEFAULT_OAUTH_TIMEOUT_SECS,
            posthog_api_key: default_posthog_api_key(),
            posthog_host: default_posthog_host(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults.
    ///
    /// Environment variables win over the file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(CoreError::file(path))?;
        serde_json::from_str(&content).map_err(|source| CoreError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content =
            serde_json::to_string_pretty(self).map_err(|source| CoreError::ConfigFormat {
                path: config_path.clone(),
                source,
            })?;
        std::fs::write(&config_path, content).map_err(CoreError::file(&config_path))
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(log_level) = lookup("EXPENSE_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(api_url) = lookup("EXPENSE_API_URL") {
            self.api_url = api_url;
        }
        if let Some(api_key) = lookup("EXPENSE_POSTHOG_API_KEY") {
            self.posthog_api_key = Some(api_key);
        }
    }

    /// Get the backend URL as a parsed URL.
    pub fn api_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_url).map_err(|source| CoreError::ApiUrl {
            url: self.api_url.clone(),
            source,
        })
    }

    /// Get the fixed URL that starts the Google OAuth flow.
    ///
    /// Resolved beneath `api_url`, so a base path such as `/api` is kept.
    pub fn google_auth_url(&self) -> CoreResult<Url> {
        let mut base = self.api_url()?;
        if base.cannot_be_a_base() {
            return Err(CoreError::NotABase(self.api_url.clone()));
        }
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        base.join(GOOGLE_AUTH_PATH)
            .map_err(|source| CoreError::ApiUrl {
                url: self.api_url.clone(),
                source,
            })
    }
}
