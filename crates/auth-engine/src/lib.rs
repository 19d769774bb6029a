//! Authentication session lifecycle for the expense tracker desktop shell.
//!
//! This crate provides:
//! - Current-user resolution against the backend auth endpoints
//! - An explicit FSM-based auth status with bounded retry on startup
//! - Token exchange for credentials delivered out of band
//! - OAuth flow via local HTTP callback server
//! - A bridge forwarding the signed-in identity to the host shell

mod auth_fsm;
mod authority;
mod backoff;
mod bridge;
mod context;
mod error;
mod oauth;
mod opener;
mod resolver;
mod user;

#[cfg(test)]
mod tests;

pub use auth_fsm::auth_machine;
pub use auth_fsm::{
    AuthMachine, AuthMachineInput, AuthMachineState, AuthStateChangedPayload, AuthStatus,
    RetryConfig,
};
pub use authority::{AuthAuthority, HttpAuthAuthority, CURRENT_USER_PATH, LOGOUT_PATH};
pub use backoff::{Sleeper, TokioSleeper};
pub use bridge::{deliver_credentials, ChannelBridge, ShellBridge};
pub use context::{AuthContext, AuthSnapshot, AuthStateCallback, BootstrapReport};
pub use error::{AuthError, AuthResult, BridgeError, ResolveError};
pub use oauth::{OAuthCallbackServer, OAuthResult};
pub use opener::{SystemBrowserOpener, UrlOpener};
pub use resolver::CurrentUserResolver;
pub use user::{UserIdentity, UserRecord};
