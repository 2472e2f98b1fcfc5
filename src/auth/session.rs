//! Session cache
//!
//! Table of recently verified identities, keyed by client ID and username.

use crate::auth::VerifiedIdentity;
use dashmap::DashMap;
use std::fmt;

/// Cache slot identity: one slot per (client ID, username) pair
///
/// The password is not part of the key, so a live session is
/// reused whatever secret the client presents next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub client_id: String,
    pub username: String,
}

impl SessionKey {
    pub fn new(client_id: &str, username: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            username: username.to_string(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.client_id, self.username)
    }
}

/// A verified identity and the time it stops being trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Team the credentials belong to
    pub team_id: u64,
    /// Client record on the verification side
    pub client_record_id: u64,
    /// API token used to authenticate
    pub api_token_id: u64,
    /// Expiry in epoch seconds
    pub expires_at: u64,
}

impl Session {
    pub fn from_identity(identity: VerifiedIdentity, expires_at: u64) -> Self {
        Self {
            team_id: identity.team_id,
            client_record_id: identity.mqtt_client_id,
            api_token_id: identity.api_token_id,
            expires_at,
        }
    }

    /// Whether the session is still trusted at `now`
    pub fn is_live(&self, now: u64) -> bool {
        self.expires_at > now
    }
}

/// Concurrent session table
///
/// Backed by a sharded map: readers and writers for different keys rarely
/// contend, and a sweep only holds one shard at a time.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: DashMap<SessionKey, Session>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live session. Expired entries read as absent but stay in place.
    pub fn get(&self, key: &SessionKey, now: u64) -> Option<Session> {
        self.entries
            .get(key)
            .map(|entry| *entry.value())
            .filter(|session| session.is_live(now))
    }

    /// Store a session, replacing whatever was there
    pub fn put(&self, key: SessionKey, session: Session) {
        self.entries.insert(key, session);
    }

    /// Extend a live session's expiry in place.
    ///
    /// The liveness check and the update happen under the same entry lock.
    /// Returns the refreshed session, or `None` when there was nothing live to extend.
    pub fn refresh(&self, key: &SessionKey, now: u64, expires_at: u64) -> Option<Session> {
        let mut entry = self.entries.get_mut(key)?;
        let session = entry.value_mut();
        if !session.is_live(now) {
            return None;
        }
        session.expires_at = session.expires_at.max(expires_at);
        Some(*session)
    }

    /// Remove every entry that expired strictly before `now`
    pub fn delete_expired(&self, now: u64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, session| {
            let keep = session.expires_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of stored entries, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
