//! Broker-facing authentication hook

use super::ClientInfo;
use crate::auth::AuthGateway;
use crate::config::AclMode;
use std::sync::Arc;
use tracing::{debug, info};

/// Answers the broker's connect-authentication and ACL questions
pub struct AuthHook {
    gateway: Arc<AuthGateway>,
    acl_mode: AclMode,
}

impl AuthHook {
    pub fn new(gateway: Arc<AuthGateway>, acl_mode: AclMode) -> Self {
        Self { gateway, acl_mode }
    }

    /// Hook name for logging
    pub fn id(&self) -> &str {
        "custom-auth"
    }

    /// Decide a CONNECT. Non-UTF-8 password bytes are replaced, not rejected.
    pub async fn on_connect_authenticate(&self, client: &ClientInfo, username: &str, password: &[u8]) -> bool {
        info!(username = %username, remote = %client.remote, "Authenticating");

        let password = String::from_utf8_lossy(password);
        let allowed = self.gateway.authenticate(&client.id, username, &password).await;

        if !allowed {
            info!(client_id = %client.id, username = %username, "Connection denied");
        }
        allowed
    }

    /// Decide whether a client may read or write a topic.
    ///
    /// Topic patterns are not evaluated here; in session mode the client only
    /// has to hold a live session, and no remote verification is attempted.
    pub async fn on_acl_check(&self, client: &ClientInfo, username: &str, topic: &str, write: bool) -> bool {
        debug!(
            client_id = %client.id,
            username = %username,
            topic = %topic,
            write,
            "Authenticating ACL"
        );

        match self.acl_mode {
            AclMode::AllowAll => true,
            AclMode::RequireSession => self.gateway.authenticate(&client.id, username, "").await,
        }
    }

    pub fn acl_mode(&self) -> AclMode {
        self.acl_mode
    }
}
