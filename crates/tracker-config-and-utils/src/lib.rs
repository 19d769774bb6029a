//! Configuration, file system paths and logging bootstrap for the expense tracker.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_URL, DEFAULT_LOG_LEVEL, DEFAULT_OAUTH_CALLBACK_PORT,
    DEFAULT_OAUTH_TIMEOUT_SECS, DEFAULT_POSTHOG_HOST, GOOGLE_AUTH_PATH,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
