//! Authentication state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                 ┌─────────────────┐
//!                 │     Loading     │ (initial)
//!                 └────────┬────────┘
//!           UserResolved   │   ResolutionFailed / LoggedOut
//!          ┌───────────────┴───────────────┐
//!          ▼                               ▼
//! ┌─────────────────┐   LoggedOut   ┌─────────────────┐
//! │  Authenticated  │ ────────────► │ Unauthenticated │
//! └────────┬────────┘               └────────┬────────┘
//!          │ ResolutionStarted               │ ResolutionStarted
//!          └──────────────► Loading ◄────────┘
//! ```
//!
//! `Unauthenticated` only reaches `Authenticated` through a new resolution
//! sequence, i.e. by way of `Loading`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub auth_machine(Loading)

    Loading => {
        ResolutionStarted => Loading,
        UserResolved => Authenticated,
        ResolutionFailed => Unauthenticated,
        LoggedOut => Unauthenticated
    },
    Authenticated => {
        ResolutionStarted => Loading,
        LoggedOut => Unauthenticated
    },
    Unauthenticated => {
        ResolutionStarted => Loading,
        LoggedOut => Unauthenticated
    }
}

pub use auth_machine::Input as AuthMachineInput;
pub use auth_machine::State as AuthMachineState;
pub use auth_machine::StateMachine as AuthMachine;

/// Public view of the auth state, for UI and status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// A resolution sequence is in progress.
    Loading,
    /// A user record is held.
    Authenticated,
    /// No user record is held.
    Unauthenticated,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthStatus::Authenticated)
    }

    /// Returns true once a resolution sequence has produced an outcome.
    pub fn is_settled(&self) -> bool {
        !matches!(self, AuthStatus::Loading)
    }
}

impl From<&AuthMachineState> for AuthStatus {
    fn from(state: &AuthMachineState) -> Self {
        match state {
            AuthMachineState::Loading => AuthStatus::Loading,
            AuthMachineState::Authenticated => AuthStatus::Authenticated,
            AuthMachineState::Unauthenticated => AuthStatus::Unauthenticated,
        }
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuthStatus::Loading => "loading",
            AuthStatus::Authenticated => "authenticated",
            AuthStatus::Unauthenticated => "unauthenticated",
        };
        f.write_str(label)
    }
}

/// Retry policy for the startup resolution.
///
/// Only an unreachable auth server is retried. The delay is fixed.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay between attempts in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            backoff_ms: 500,
        }
    }
}

impl RetryConfig {
    /// Delay before the given retry (1-indexed). Constant across attempts.
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Payload for auth state change events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStateChangedPayload {
    pub status: AuthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
