//! Host analytics sink for the signed-in identity.
//!
//! Drains the identities forwarded by the auth context and records one PostHog
//! `capture` event per sign-in. Without an API key the event is only logged.

use anyhow::Result;
use auth_engine::UserIdentity;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracker_config_and_utils::Config;
use url::Url;

/// Event name recorded for every sign-in.
pub const LOGIN_EVENT: &str = "user_logged_in";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

struct PosthogTarget {
    api_key: String,
    capture_url: Url,
}

pub struct AnalyticsSink {
    client: Client,
    target: Option<PosthogTarget>,
}

impl AnalyticsSink {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let api_key = config
            .posthog_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());

        let target = match api_key {
            Some(api_key) => match capture_url(&config.posthog_host) {
                Ok(capture_url) => Some(PosthogTarget {
                    api_key: api_key.to_string(),
                    capture_url,
                }),
                Err(e) => {
                    warn!(host = %config.posthog_host, error = %e, "Invalid PostHog host, analytics disabled");
                    None
                }
            },
            None => None,
        };

        Ok(Self { client, target })
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Record one sign-in. Fire and forget: failures are logged, never retried.
    pub async fn record(&self, identity: &UserIdentity) {
        let Some(target) = &self.target else {
            info!(name = %identity.name, "User signed in");
            return;
        };

        let payload = capture_payload(&target.api_key, identity);
        match self
            .client
            .post(target.capture_url.clone())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(event = LOGIN_EVENT, "Analytics event recorded")
            }
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Analytics event rejected")
            }
            Err(e) => debug!(error = %e, "Analytics event not delivered"),
        }
    }
}

fn capture_url(host: &str) -> Result<Url> {
    let base = Url::parse(host.trim())?;
    Ok(base.join("/capture/")?)
}

fn capture_payload(api_key: &str, identity: &UserIdentity) -> Value {
    json!({
        "api_key": api_key,
        "event": LOGIN_EVENT,
        "distinct_id": identity.email,
        "properties": {
            "name": identity.name,
            "email": identity.email,
            "$lib": "expense-tracker-desktop",
        },
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Record every forwarded identity until the bridge closes.
///
/// Returns the number of identities received.
pub async fn run(sink: AnalyticsSink, mut identities: mpsc::UnboundedReceiver<UserIdentity>) -> usize {
    let mut received = 0;
    while let Some(identity) = identities.recv().await {
        received += 1;
        sink.record(&identity).await;
    }
    debug!(received, "Analytics sink stopped");
    received
}
