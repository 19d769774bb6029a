//! Remote auth authority: the backend's current-user and logout endpoints.

use crate::{AuthResult, ResolveError, UserRecord};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Path answering "who is this credential?", relative to the API base.
pub const CURRENT_USER_PATH: &str = "auth/me";
/// Path ending the server-side session, relative to the API base.
pub const LOGOUT_PATH: &str = "auth/logout";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend that knows which user a credential belongs to.
#[async_trait]
pub trait AuthAuthority: Send + Sync {
    /// One round trip; no retries.
    async fn current_user(&self, credential: Option<&str>) -> Result<UserRecord, ResolveError>;

    /// End the server-side session.
    async fn logout(&self, credential: Option<&str>) -> Result<(), ResolveError>;
}

/// HTTP implementation sending the credential as a bearer token.
pub struct HttpAuthAuthority {
    client: Client,
    current_user_url: Url,
    logout_url: Url,
}

impl HttpAuthAuthority {
    pub fn new(api_url: &Url) -> AuthResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(api_url, client)
    }

    pub fn with_client(api_url: &Url, client: Client) -> AuthResult<Self> {
        Ok(Self {
            client,
            current_user_url: endpoint(api_url, CURRENT_USER_PATH)?,
            logout_url: endpoint(api_url, LOGOUT_PATH)?,
        })
    }
}

/// Resolve `path` beneath `api_url`, keeping any base path.
fn endpoint(api_url: &Url, path: &str) -> AuthResult<Url> {
    let mut base = api_url.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path)?)
}

#[async_trait]
impl AuthAuthority for HttpAuthAuthority {
    async fn current_user(&self, credential: Option<&str>) -> Result<UserRecord, ResolveError> {
        debug!(url = %self.current_user_url, has_credential = credential.is_some(), "Fetching current user");

        let mut request = self.client.get(self.current_user_url.clone());
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ResolveError::from_status(status.as_u16(), body));
        }

        UserRecord::from_response(status.as_u16(), &body)
    }

    async fn logout(&self, credential: Option<&str>) -> Result<(), ResolveError> {
        debug!(url = %self.logout_url, "Logging out remotely");

        let mut request = self.client.post(self.logout_url.clone());
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::from_status(status.as_u16(), body));
        }

        Ok(())
    }
}
