//! Authentication error types.

use thiserror::Error;

/// Failure of a single current-user or logout call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The auth server could not be reached (connect failure, timeout, dropped connection).
    #[error("Auth server unreachable")]
    NetworkUnreachable,

    /// HTTP 401: no valid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other HTTP failure, or a success body that is not a user record.
    #[error("HTTP {status}: {body}")]
    OtherHttp { status: u16, body: String },
}

impl ResolveError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status == 401 {
            ResolveError::Unauthorized
        } else {
            ResolveError::OtherHttp {
                status,
                body: body.into(),
            }
        }
    }

    /// Returns true if the call may succeed when retried.
    ///
    /// Only an unreachable server is transient; server errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::NetworkUnreachable)
    }

    /// HTTP status carried by this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ResolveError::NetworkUnreachable => None,
            ResolveError::Unauthorized => Some(401),
            ResolveError::OtherHttp { status, .. } => Some(*status),
        }
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ResolveError::from_status(status.as_u16(), e.to_string()),
            None => {
                tracing::debug!(error = %e, timeout = e.is_timeout(), "Transport failure");
                ResolveError::NetworkUnreachable
            }
        }
    }
}

/// Failure handing data to the host shell. Callers ignore it.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge delivery failed: {0}")]
    DeliveryFailure(String),
}

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Current-user or logout call failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Session store error
    #[error("Storage error: {0}")]
    Storage(#[from] tracker_storage::StorageError),

    /// Invalid state transition in the auth FSM
    #[error("Invalid auth state transition: {0}")]
    InvalidStateTransition(String),

    /// A startup resolution already ran or is running in this process
    #[error("Bootstrap already started")]
    BootstrapAlreadyStarted,

    /// A logout ended the session while this resolution was in flight
    #[error("Resolution superseded by logout")]
    ResolutionSuperseded,

    /// OAuth callback flow error
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// System browser could not be opened
    #[error("Failed to open browser: {0}")]
    Browser(String),

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl AuthError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Resolve(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_401_is_unauthorized() {
        assert_eq!(ResolveError::from_status(401, "nope"), ResolveError::Unauthorized);
    }

    #[test]
    fn test_from_status_other() {
        assert_eq!(
            ResolveError::from_status(500, "boom"),
            ResolveError::OtherHttp {
                status: 500,
                body: "boom".to_string()
            }
        );
        assert_eq!(ResolveError::from_status(403, "").status(), Some(403));
    }

    #[test]
    fn test_only_unreachable_is_transient() {
        assert!(ResolveError::NetworkUnreachable.is_transient());
        assert!(!ResolveError::Unauthorized.is_transient());
        assert!(!ResolveError::from_status(503, "unavailable").is_transient());
    }

    #[test]
    fn test_auth_error_transient_delegates() {
        assert!(AuthError::from(ResolveError::NetworkUnreachable).is_transient());
        assert!(!AuthError::BootstrapAlreadyStarted.is_transient());
        assert!(!AuthError::OAuth("denied".to_string()).is_transient());
    }

    #[test]
    fn test_resolve_error_display() {
        let err = AuthError::from(ResolveError::from_status(502, "bad gateway"));
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}
