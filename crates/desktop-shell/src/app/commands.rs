//! Status, login and logout commands.

use crate::app::Shell;
use crate::output::row;
use anyhow::{bail, Result};
use auth_engine::{deliver_credentials, AuthStatus, OAuthCallbackServer, UserRecord};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Result of the `status` command.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub status: AuthStatus,
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", row("Auth", &self.status.to_string()))?;
        if let Some(user) = &self.user {
            write!(f, "\n{}", row("User", &format!("{} <{}>", user.name, user.email)))?;
            write!(f, "\n{}", row("Role", &user.role))?;
        }
        if self.retries > 0 {
            write!(f, "\n{}", row("Retries", &self.retries.to_string()))?;
        }
        Ok(())
    }
}

/// Result of the `login` command.
#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub already_signed_in: bool,
    pub user: UserRecord,
}

impl fmt::Display for LoginOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.already_signed_in {
            "Already signed in as"
        } else {
            "Signed in as"
        };
        write!(f, "{} {} <{}>", prefix, self.user.name, self.user.email)
    }
}

/// Resolve the stored session.
pub async fn status(shell: &Shell) -> Result<StatusView> {
    let report = shell.context.bootstrap().await?;
    Ok(StatusView {
        status: report.status,
        retries: report.retries,
        user: shell.context.user(),
    })
}

/// Sign in through the browser unless the stored session is still valid.
pub async fn login(shell: &Shell, timeout_secs: Option<u64>) -> Result<LoginOutcome> {
    shell.context.bootstrap().await?;
    if let Some(user) = shell.context.user() {
        return Ok(LoginOutcome {
            already_signed_in: true,
            user,
        });
    }

    let server = OAuthCallbackServer::new(
        shell.config.oauth_callback_port,
        timeout_secs.unwrap_or(shell.config.oauth_timeout_secs),
    );
    let listener = server.bind().await?;

    if let Err(e) = shell.context.login_with_google() {
        warn!(error = %e, "Could not open the system browser");
        eprintln!(
            "Open this URL to sign in: {}",
            shell.context.google_auth_url()
        );
    }

    let result = server.serve(listener).await?;
    let Some(token) = result.token else {
        bail!(
            "Sign-in failed: {}",
            result.error.as_deref().unwrap_or("no credential received")
        );
    };

    // Same path a platform callback takes: the credential goes through the bridge.
    let (credentials, delivered) = mpsc::unbounded_channel();
    credentials.send(token)?;
    drop(credentials);

    if deliver_credentials(shell.context.clone(), delivered).await == 0 {
        bail!("Sign-in failed: the server did not accept the credential");
    }

    let Some(user) = shell.context.user() else {
        bail!("Sign-in failed: session ended before it could be confirmed");
    };
    info!(user_id = %user.id, "Signed in");

    Ok(LoginOutcome {
        already_signed_in: false,
        user,
    })
}

/// End the session. The local credential is cleared even when the server is down.
pub async fn logout(shell: &Shell) -> Result<()> {
    shell.context.logout().await?;
    Ok(())
}
