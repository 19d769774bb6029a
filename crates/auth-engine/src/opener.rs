//! Opening the OAuth start URL in a new browsing context.

use crate::{AuthError, AuthResult};
use tracing::debug;
use url::Url;

/// Navigates to an external URL. Returns as soon as the request is handed off.
pub trait UrlOpener: Send + Sync {
    fn open_url(&self, url: &Url) -> AuthResult<()>;
}

/// Opens URLs in the user's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowserOpener;

impl UrlOpener for SystemBrowserOpener {
    fn open_url(&self, url: &Url) -> AuthResult<()> {
        debug!(url = %url, "Opening system browser");
        open::that(url.as_str()).map_err(|e| AuthError::Browser(e.to_string()))
    }
}
