//! Authentication module
//!
//! Cache-fronted credential checking for MQTT clients: a session table, a
//! remote verifier consulted on misses, and a background sweeper that evicts
//! expired sessions.

mod gateway;
mod session;
mod sweeper;
mod verifier;

pub use gateway::AuthGateway;
pub use session::{Session, SessionCache, SessionKey};
pub use sweeper::ExpirySweeper;
pub use verifier::{HttpVerifier, RemoteVerifier, VerifiedIdentity};
