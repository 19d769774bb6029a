//! Shell wiring: one auth context per process plus the host analytics task.

use crate::app::analytics::{self, AnalyticsSink};
use anyhow::Result;
use auth_engine::{
    AuthContext, ChannelBridge, HttpAuthAuthority, OAuthCallbackServer, SystemBrowserOpener,
    UrlOpener,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracker_config_and_utils::{Config, Paths};
use tracker_storage::create_session_store;

/// Running shell state.
pub struct Shell {
    pub config: Config,
    pub paths: Paths,
    pub context: Arc<AuthContext>,
    analytics: JoinHandle<usize>,
}

/// Build the auth context and start the analytics sink.
///
/// Must be called inside a tokio runtime.
pub fn start_shell(config: Config, paths: Paths) -> Result<Shell> {
    start_shell_with_opener(config, paths, Arc::new(SystemBrowserOpener))
}

/// Like [`start_shell`], with the sign-in page handed to `opener` instead of the system browser.
pub fn start_shell_with_opener(
    config: Config,
    paths: Paths,
    opener: Arc<dyn UrlOpener>,
) -> Result<Shell> {
    paths.ensure_dirs()?;

    let api_url = config.api_url()?;
    info!(api_url = %api_url, base_dir = %paths.base_dir().display(), "Starting desktop shell");

    let store = Arc::new(create_session_store(&paths.session_file()));
    let authority = Arc::new(HttpAuthAuthority::new(&api_url)?);

    // The backend redirects the browser to the local callback listener.
    let callback = OAuthCallbackServer::new(config.oauth_callback_port, config.oauth_timeout_secs);
    let google_auth_url = callback.auth_url(&config.google_auth_url()?);

    let (bridge, identities) = ChannelBridge::channel();
    let sink = AnalyticsSink::from_config(&config)?;
    debug!(enabled = sink.is_enabled(), "Analytics sink configured");
    let analytics = tokio::spawn(analytics::run(sink, identities));

    let context = AuthContext::new(store, authority, google_auth_url)
        .with_opener(opener)
        .with_bridge(Arc::new(bridge));
    context.set_state_callback(Box::new(|payload| {
        debug!(status = %payload.status, user_id = ?payload.user_id, "Auth status changed");
    }));

    Ok(Shell {
        config,
        paths,
        context: Arc::new(context),
        analytics,
    })
}

impl Shell {
    /// Detach the bridge and wait for pending analytics events.
    pub async fn shutdown(self) {
        self.context.teardown();
        match self.analytics.await {
            Ok(received) => debug!(
                received,
                base_dir = %self.paths.base_dir().display(),
                "Desktop shell stopped"
            ),
            Err(e) => warn!(error = %e, "Analytics task failed"),
        }
    }
}
