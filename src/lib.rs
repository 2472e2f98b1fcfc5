//! Authentication gateway for MQTT brokers
//!
//! Decides whether a connecting MQTT client is allowed:
//!
//! - **Session cache**: recently verified (client ID, username) pairs are
//!   trusted until their TTL runs out, and every hit extends the TTL
//! - **Remote verification**: on a miss, credentials are checked against an
//!   HTTP identity endpoint. Any failure denies the client
//! - **Expiry sweeper**: a background task evicts expired sessions
//! - **Hooks**: an adapter for the broker's auth/ACL callbacks, plus a
//!   registry that relays lifecycle events to a notifier
//!
//! # Example Configuration
//!
//! ```json
//! {
//!   "auth": {
//!     "url": "https://panel.example.com/api/mqtt/auth",
//!     "timeout-ms": 10000
//!   },
//!   "session": {
//!     "ttl-secs": 86400,
//!     "sweep-interval-secs": 604800
//!   },
//!   "hooks": {
//!     "acl-mode": "allow-all",
//!     "notify": true
//!   }
//! }
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod notify;

// Re-export main types
pub use auth::{AuthGateway, HttpVerifier, RemoteVerifier};
pub use config::GatewayConfig;
pub use error::VerifyError;
