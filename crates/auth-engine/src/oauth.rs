//! OAuth callback server for browser-based authentication.
//!
//! The backend finishes the Google flow by redirecting the browser to
//! `http://localhost:<port>/callback?token=<credential>` (or `?error=<reason>`).

use crate::{AuthError, AuthResult};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info};
use url::Url;

/// Most header lines accepted before the request is refused.
const MAX_HEADER_LINES: usize = 64;

/// Longest request or header line accepted, in bytes.
const MAX_LINE_BYTES: u64 = 8 * 1024;

/// OAuth callback result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthResult {
    /// Credential delivered by the backend (if successful).
    pub token: Option<String>,
    /// Error message (if failed).
    pub error: Option<String>,
}

impl OAuthResult {
    pub fn success(token: String) -> Self {
        Self {
            token: Some(token),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            token: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.token.is_some()
    }
}

/// OAuth callback server that listens for the authentication redirect.
pub struct OAuthCallbackServer {
    port: u16,
    timeout_secs: u64,
}

impl OAuthCallbackServer {
    pub fn new(port: u16, timeout_secs: u64) -> Self {
        Self { port, timeout_secs }
    }

    /// Get the callback URL for this server.
    pub fn callback_url(&self) -> String {
        format!("http://localhost:{}/callback", self.port)
    }

    /// The OAuth start URL with this server registered as the redirect target.
    pub fn auth_url(&self, google_auth_url: &Url) -> Url {
        let mut url = google_auth_url.clone();
        url.query_pairs_mut()
            .append_pair("callback", &self.callback_url());
        url
    }

    /// Bind the callback port.
    pub async fn bind(&self) -> AuthResult<TcpListener> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::OAuth(format!("Failed to bind to {}: {}", addr, e)))?;
        info!(port = self.port, "OAuth callback server listening");
        Ok(listener)
    }

    /// Accept connections on `listener` until one carries a callback or the timeout fires.
    ///
    /// A timeout is reported as a failed result rather than an error.
    pub async fn serve(&self, listener: TcpListener) -> AuthResult<OAuthResult> {
        let (tx, rx) = oneshot::channel::<OAuthResult>();
        let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

        let server_handle = tokio::spawn({
            let tx = tx.clone();
            async move {
                loop {
                    match listener.accept().await {
                        Ok((mut socket, _)) => {
                            let tx = tx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(&mut socket, tx).await {
                                    error!("Error handling connection: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        let timeout = tokio::time::Duration::from_secs(self.timeout_secs);
        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => OAuthResult::failure("Internal error: channel closed"),
            Err(_) => OAuthResult::failure("OAuth timeout"),
        };

        server_handle.abort();

        Ok(result)
    }
}

/// Parse the request target of a callback request.
fn parse_callback(target: &str) -> Option<OAuthResult> {
    let url = Url::parse("http://localhost").ok()?.join(target).ok()?;
    if url.path() != "/callback" {
        return None;
    }

    let mut token = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "token" if !value.is_empty() => token = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    Some(match (error, token) {
        (Some(err), _) => OAuthResult::failure(err),
        (None, Some(token)) => OAuthResult::success(token),
        (None, None) => OAuthResult::failure("Missing token"),
    })
}

/// Read one line of at most `MAX_LINE_BYTES`, returning the bytes consumed.
async fn read_bounded_line<R>(reader: &mut R, line: &mut String) -> AuthResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let read = (&mut *reader).take(MAX_LINE_BYTES).read_line(line).await?;
    if read as u64 == MAX_LINE_BYTES && !line.ends_with('\n') {
        return Err(AuthError::OAuth("Request line too long".to_string()));
    }
    Ok(read)
}

/// Handle an incoming HTTP connection.
async fn handle_connection(
    socket: &mut tokio::net::TcpStream,
    tx: Arc<tokio::sync::Mutex<Option<oneshot::Sender<OAuthResult>>>>,
) -> AuthResult<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut request_line = String::new();
    read_bounded_line(&mut reader, &mut request_line).await?;

    // Drain the headers so closing the socket does not reset the connection.
    let mut header = String::new();
    let mut header_lines = 0;
    loop {
        header.clear();
        if read_bounded_line(&mut reader, &mut header).await? == 0 || header.trim().is_empty() {
            break;
        }
        header_lines += 1;
        if header_lines > MAX_HEADER_LINES {
            send_response(
                &mut writer,
                431,
                "Request Header Fields Too Large",
                "Request Header Fields Too Large",
            )
            .await?;
            return Ok(());
        }
    }

    // GET /callback?... HTTP/1.1
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        send_response(&mut writer, 400, "Bad Request", "Bad Request").await?;
        return Ok(());
    };
    debug!(method = %method, path = %target.split('?').next().unwrap_or(""), "Received request");

    if method != "GET" {
        send_response(&mut writer, 405, "Method Not Allowed", "Method Not Allowed").await?;
        return Ok(());
    }

    let Some(result) = parse_callback(target) else {
        send_response(&mut writer, 404, "Not Found", "Not Found").await?;
        return Ok(());
    };

    match &result.error {
        Some(err) => send_response(&mut writer, 200, "OK", &error_page(err)).await?,
        None => send_response(&mut writer, 200, "OK", &success_page()).await?,
    }

    if let Some(tx) = tx.lock().await.take() {
        let _ = tx.send(result);
    }

    Ok(())
}

/// Send an HTTP response.
async fn send_response(
    writer: &mut tokio::net::tcp::WriteHalf<'_>,
    status_code: u16,
    status_text: &str,
    body: &str,
) -> AuthResult<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_code,
        status_text,
        body.len(),
        body
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn success_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Expense Tracker - Signed In</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px; background: #f5f5f5;">
<div style="max-width: 400px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px;">
<h1 style="color: #22c55e;">Signed in</h1>
<p style="color: #666;">You can close this window and return to Expense Tracker.</p>
</div>
<script>setTimeout(() => window.close(), 2000);</script>
</body>
</html>"#
        .to_string()
}

fn error_page(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Expense Tracker - Sign-in Failed</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px; background: #f5f5f5;">
<div style="max-width: 400px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px;">
<h1 style="color: #ef4444;">Sign-in failed</h1>
<p style="color: #666;">Error: {}</p>
<p style="color: #888; font-size: 14px;">You can close this window and try again.</p>
</div>
</body>
</html>"#,
        html_escape(error)
    )
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
