//! Process-wide auth context with FSM-based status tracking.
//!
//! One `AuthContext` exists per process. It is created at startup, shared by
//! `Arc` with every consumer and torn down on exit. The FSM and the held user
//! record live behind one lock, so the status is `Authenticated` exactly when
//! a user record is held.

use crate::auth_fsm::{
    AuthMachine, AuthMachineInput, AuthMachineState, AuthStateChangedPayload, AuthStatus,
    RetryConfig,
};
use crate::{
    AuthAuthority, AuthError, AuthResult, CurrentUserResolver, ResolveError, ShellBridge,
    Sleeper, SystemBrowserOpener, TokioSleeper, UrlOpener, UserRecord,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracker_storage::SessionStore;
use url::Url;

/// Callback type for auth state change notifications.
pub type AuthStateCallback = Box<dyn Fn(AuthStateChangedPayload) + Send + Sync>;

/// Point-in-time view of the context.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

/// Outcome of the startup resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Status once the bootstrap sequence finished.
    pub status: AuthStatus,
    /// Retries spent on an unreachable server.
    pub retries: u32,
}

struct AuthInner {
    machine: AuthMachine,
    user: Option<UserRecord>,
    // Bumped by logout. Resolutions started under an older epoch are discarded.
    epoch: u64,
}

impl AuthInner {
    fn status(&self) -> AuthStatus {
        AuthStatus::from(self.machine.state())
    }

    fn consume(&mut self, input: &AuthMachineInput) -> AuthResult<()> {
        if self.machine.consume(input).is_err() {
            return Err(AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                self.machine.state()
            )));
        }
        Ok(())
    }

    fn payload(&self) -> AuthStateChangedPayload {
        AuthStateChangedPayload {
            status: self.status(),
            user_id: self.user.as_ref().map(|u| u.id.clone()),
            email: self.user.as_ref().map(|u| u.email.clone()),
        }
    }
}

pub struct AuthContext {
    store: Arc<SessionStore>,
    resolver: CurrentUserResolver,
    google_auth_url: Url,
    retry_config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
    opener: Arc<dyn UrlOpener>,
    bridge: Mutex<Option<Arc<dyn ShellBridge>>>,
    inner: Mutex<AuthInner>,
    state_callback: Mutex<Option<AuthStateCallback>>,
    bootstrap_started: AtomicBool,
}

impl AuthContext {
    /// Create a context in the `Loading` state.
    ///
    /// `google_auth_url` is the fixed URL that starts the OAuth flow.
    pub fn new(
        store: Arc<SessionStore>,
        authority: Arc<dyn AuthAuthority>,
        google_auth_url: Url,
    ) -> Self {
        Self {
            resolver: CurrentUserResolver::new(store.clone(), authority),
            store,
            google_auth_url,
            retry_config: RetryConfig::default(),
            sleeper: Arc::new(TokioSleeper),
            opener: Arc::new(SystemBrowserOpener),
            bridge: Mutex::new(None),
            inner: Mutex::new(AuthInner {
                machine: AuthMachine::new(),
                user: None,
                epoch: 0,
            }),
            state_callback: Mutex::new(None),
            bootstrap_started: AtomicBool::new(false),
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Attach the host shell bridge. Without one, identity forwarding is skipped.
    pub fn with_bridge(self, bridge: Arc<dyn ShellBridge>) -> Self {
        *self.bridge.lock() = Some(bridge);
        self
    }

    /// Set a callback to be notified of auth status changes.
    pub fn set_state_callback(&self, callback: AuthStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.lock().status()
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.inner.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        let inner = self.inner.lock();
        AuthSnapshot {
            status: inner.status(),
            user: inner.user.clone(),
        }
    }

    pub fn google_auth_url(&self) -> &Url {
        &self.google_auth_url
    }

    /// Detach the state callback and the bridge. Later changes are not published.
    pub fn teardown(&self) {
        self.state_callback.lock().take();
        self.bridge.lock().take();
        debug!(status = %self.status(), "Auth context torn down");
    }

    /// Apply an FSM update and notify the callback if the status changed.
    ///
    /// The user record is dropped whenever the resulting status is not
    /// `Authenticated`.
    fn update<F>(&self, apply: F) -> AuthResult<AuthStatus>
    where
        F: FnOnce(&mut AuthInner) -> AuthResult<()>,
    {
        let (old_status, new_status, payload) = {
            let mut inner = self.inner.lock();
            let old_status = inner.status();
            apply(&mut *inner)?;
            if !inner.status().is_authenticated() {
                inner.user = None;
            }
            (old_status, inner.status(), inner.payload())
        };

        if old_status != new_status {
            debug!(
                old_status = %old_status,
                new_status = %new_status,
                "Auth status transition"
            );
            if let Some(callback) = self.state_callback.lock().as_ref() {
                callback(payload);
            }
        }

        Ok(new_status)
    }

    /// Enter `Loading` and return the epoch the new sequence belongs to.
    fn begin_resolution(&self) -> AuthResult<u64> {
        let mut epoch = 0;
        self.update(|inner| {
            inner.consume(&AuthMachineInput::ResolutionStarted)?;
            epoch = inner.epoch;
            Ok(())
        })?;
        Ok(epoch)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.inner.lock().epoch == epoch
    }

    /// Record the outcome of a resolution sequence started in `epoch`.
    ///
    /// Bootstrap and token exchange may overlap; whichever settles last owns the
    /// status. A late outcome re-enters `Loading` before applying itself.
    /// Returns `None` without touching state when a logout happened since the
    /// sequence started.
    fn settle(&self, epoch: u64, user: Option<UserRecord>) -> AuthResult<Option<AuthStatus>> {
        let mut current = true;
        let status = self.update(|inner| {
            if inner.epoch != epoch {
                current = false;
                return Ok(());
            }
            if *inner.machine.state() != AuthMachineState::Loading {
                inner.consume(&AuthMachineInput::ResolutionStarted)?;
            }
            match user {
                Some(user) => {
                    inner.consume(&AuthMachineInput::UserResolved)?;
                    inner.user = Some(user);
                }
                None => inner.consume(&AuthMachineInput::ResolutionFailed)?,
            }
            Ok(())
        })?;

        if !current {
            debug!(epoch, "Resolution outcome discarded after logout");
        }
        Ok(current.then_some(status))
    }

    /// Determine the initial status. Runs at most once per process.
    ///
    /// An unreachable server is retried up to `max_retries` times with a fixed
    /// delay. 401 means "not signed in" and is not reported as an error.
    pub async fn bootstrap(&self) -> AuthResult<BootstrapReport> {
        if self.bootstrap_started.swap(true, Ordering::SeqCst) {
            warn!("Bootstrap already started, ignoring repeated call");
            return Err(AuthError::BootstrapAlreadyStarted);
        }

        let epoch = self.begin_resolution()?;
        let mut retries = 0;

        loop {
            if !self.is_current(epoch) {
                debug!(retries, "Logged out during startup resolution, stopping");
                return Ok(BootstrapReport {
                    status: self.status(),
                    retries,
                });
            }

            match self.resolver.get_current_user().await {
                Ok(user) => {
                    let user_id = user.id.clone();
                    let status = match self.settle(epoch, Some(user))? {
                        Some(status) => {
                            info!(user_id = %user_id, retries, "Session resolved on startup");
                            status
                        }
                        None => self.status(),
                    };
                    return Ok(BootstrapReport { status, retries });
                }
                Err(e) if e.is_transient() && retries < self.retry_config.max_retries => {
                    retries += 1;
                    let delay = self.retry_config.delay_for_attempt(retries);
                    debug!(
                        attempt = retries,
                        max_retries = self.retry_config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Auth server unreachable, retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) => {
                    match &e {
                        ResolveError::NetworkUnreachable => {
                            warn!(retries, "Auth server unreachable, giving up")
                        }
                        ResolveError::Unauthorized => debug!("No active session"),
                        ResolveError::OtherHttp { status, body } => {
                            error!(status, body = %body, "Auth check failed")
                        }
                    }
                    let status = self
                        .settle(epoch, None)?
                        .unwrap_or_else(|| self.status());
                    return Ok(BootstrapReport { status, retries });
                }
            }
        }
    }

    /// Start the Google OAuth flow in a new browsing context.
    ///
    /// Does not change the status; the credential arrives later through
    /// [`exchange_token`](Self::exchange_token).
    pub fn login_with_google(&self) -> AuthResult<()> {
        info!(url = %self.google_auth_url, "Opening Google sign-in");
        self.opener.open_url(&self.google_auth_url)
    }

    /// Persist a credential obtained out of band and resolve its user once.
    ///
    /// On any failure the credential is removed again and the status becomes
    /// `Unauthenticated`. A logout that lands while the user is being resolved
    /// wins: the outcome is dropped and `ResolutionSuperseded` is returned.
    pub async fn exchange_token(&self, credential: &str) -> AuthResult<UserRecord> {
        let epoch = self.begin_resolution()?;

        if let Err(e) = self.store.save(credential) {
            error!(error = %e, "Failed to persist credential");
            self.reject_credential(epoch)?;
            return Err(e.into());
        }

        match self.resolver.get_current_user().await {
            Ok(user) => {
                if self.settle(epoch, Some(user.clone()))?.is_none() {
                    return Err(AuthError::ResolutionSuperseded);
                }
                info!(user_id = %user.id, "Authenticated with exchanged token");
                self.forward_identity(&user);
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "Failed to authenticate with token");
                self.reject_credential(epoch)?;
                Err(e.into())
            }
        }
    }

    fn reject_credential(&self, epoch: u64) -> AuthResult<Option<AuthStatus>> {
        // After a logout the store is already empty; leave it alone.
        if self.is_current(epoch) {
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear rejected credential");
            }
        }
        self.settle(epoch, None)
    }

    /// Best-effort handoff to the host shell.
    fn forward_identity(&self, user: &UserRecord) {
        let bridge = self.bridge.lock().clone();
        let Some(bridge) = bridge else {
            return;
        };

        if let Err(e) = bridge.forward_identity(user.identity()) {
            debug!(error = %e, "Identity not forwarded to host shell");
        }
    }

    /// End the session. The remote call is best-effort; local state always clears.
    ///
    /// Resolutions still in flight are invalidated and cannot bring the user back.
    ///
    /// Returns an error only if the session store could not be cleared, and
    /// even then the status is `Unauthenticated`.
    pub async fn logout(&self) -> AuthResult<()> {
        if let Err(e) = self.resolver.logout().await {
            debug!(error = %e, "Remote logout failed, clearing local session anyway");
        }

        let cleared = self.store.clear();
        self.update(|inner| {
            inner.epoch += 1;
            inner.consume(&AuthMachineInput::LoggedOut)
        })?;
        info!("Logged out");

        cleared.map_err(|e| {
            error!(error = %e, "Failed to clear session store");
            AuthError::from(e)
        })
    }
}
