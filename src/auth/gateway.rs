//! Authentication gateway
//!
//! Decides whether a connecting client is allowed. A live cached session is
//! extended and accepted without any I/O; otherwise, if a password was
//! presented, the remote verifier is consulted and its answer cached.

use super::{ExpirySweeper, RemoteVerifier, Session, SessionCache, SessionKey};
use crate::clock::Clock;
use crate::config::SessionConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cache-fronted authenticator
pub struct AuthGateway {
    /// Verified sessions
    cache: Arc<SessionCache>,
    /// Fallback identity check
    verifier: Arc<dyn RemoteVerifier>,
    /// Time source for expiry
    clock: Arc<dyn Clock>,
    /// Session lifetime, applied on creation and on every hit
    ttl: Duration,
    /// Background eviction task, when started
    sweeper: Mutex<Option<ExpirySweeper>>,
}

impl AuthGateway {
    /// Create a gateway without background eviction.
    ///
    /// Expired sessions are still ignored on lookup; they just stay in memory
    /// until overwritten.
    pub fn new(verifier: Arc<dyn RemoteVerifier>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            cache: Arc::new(SessionCache::new()),
            verifier,
            clock,
            ttl,
            sweeper: Mutex::new(None),
        }
    }

    /// Create a gateway and start its sweeper on the current tokio runtime.
    ///
    /// The sweeper stops when `shutdown` is cancelled, when [`AuthGateway::shutdown`]
    /// is called, or when the gateway is dropped.
    pub fn start(
        config: &SessionConfig,
        verifier: Arc<dyn RemoteVerifier>,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        let gateway = Self::new(verifier, clock, config.ttl());
        let sweeper = ExpirySweeper::spawn(
            gateway.cache.clone(),
            gateway.clock.clone(),
            config.sweep_interval(),
            shutdown.child_token(),
        );
        *gateway.sweeper.lock() = Some(sweeper);

        info!(
            verifier = %gateway.verifier.name(),
            ttl_secs = config.ttl_secs,
            sweep_interval_secs = config.sweep_interval_secs,
            "Authentication gateway started"
        );
        gateway
    }

    /// Decide whether a client may connect.
    ///
    /// Fails closed: any verifier error denies.
    pub async fn authenticate(&self, client_id: &str, username: &str, password: &str) -> bool {
        let key = SessionKey::new(client_id, username);
        let now = self.clock.now();

        if self.cache.refresh(&key, now, self.expiry_from(now)).is_some() {
            debug!(client_id = %client_id, username = %username, "Session cache hit");
            return true;
        }

        // Identity-only checks never trigger a fresh verification
        if password.is_empty() {
            debug!(client_id = %client_id, username = %username, "No session and no password");
            return false;
        }

        match self.verifier.verify(client_id, username, password).await {
            Ok(identity) => {
                // Expiry counts from when verification completed
                let session = Session::from_identity(identity, self.expiry_from(self.clock.now()));
                self.cache.put(key, session);
                debug!(
                    client_id = %client_id,
                    username = %username,
                    team_id = session.team_id,
                    expires_at = session.expires_at,
                    "Session created"
                );
                true
            }
            Err(e) => {
                warn!(
                    verifier = %self.verifier.name(),
                    client_id = %client_id,
                    username = %username,
                    timeout = e.is_timeout(),
                    error = %e,
                    "Remote verification failed"
                );
                false
            }
        }
    }

    /// Session table, for observability
    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stop background eviction and wait for it to exit. Idempotent.
    pub async fn shutdown(&self) {
        // Take the handle first; the lock must not be held across the await
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.stop().await;
            info!("Authentication gateway stopped");
        }
    }

    fn expiry_from(&self, now: u64) -> u64 {
        now.saturating_add(self.ttl.as_secs())
    }
}
