//! Bridge between the auth context and the host desktop shell.
//!
//! Inbound: credentials delivered by the platform callback feed
//! [`AuthContext::exchange_token`]. Outbound: the signed-in identity is handed
//! to the host's analytics sink.

use crate::{AuthContext, BridgeError, UserIdentity};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Host-side receiver of the signed-in identity.
///
/// Fire-and-forget: implementations must not block.
pub trait ShellBridge: Send + Sync {
    fn forward_identity(&self, identity: UserIdentity) -> Result<(), BridgeError>;
}

/// Bridge backed by an unbounded channel drained by a host task.
#[derive(Clone)]
pub struct ChannelBridge {
    sender: mpsc::UnboundedSender<UserIdentity>,
}

impl ChannelBridge {
    /// Create the bridge and the receiver the host task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UserIdentity>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ShellBridge for ChannelBridge {
    fn forward_identity(&self, identity: UserIdentity) -> Result<(), BridgeError> {
        self.sender
            .send(identity)
            .map_err(|_| BridgeError::DeliveryFailure("host receiver closed".to_string()))
    }
}

/// Feed every delivered credential into the auth context until the channel closes.
///
/// Returns the number of credentials that produced an authenticated session.
pub async fn deliver_credentials(
    context: Arc<AuthContext>,
    mut credentials: mpsc::UnboundedReceiver<String>,
) -> usize {
    let mut authenticated = 0;

    while let Some(credential) = credentials.recv().await {
        debug!("Credential delivered by platform callback");
        match context.exchange_token(&credential).await {
            Ok(user) => {
                info!(user_id = %user.id, "Platform callback authenticated user");
                authenticated += 1;
            }
            Err(e) => warn!(error = %e, "Platform callback credential rejected"),
        }
    }

    debug!(authenticated, "Credential channel closed");
    authenticated
}
