//! Broker hook layer
//!
//! The broker calls [`AuthHook`] for authentication decisions and feeds
//! lifecycle events through a [`HookRegistry`] to whichever listeners
//! registered for them.

mod auth;
mod events;
mod registry;

pub use auth::AuthHook;
pub use events::{
    ClientConnected, ClientDisconnected, ClientInfo, ClientPublished, ClientSubscribed,
    ClientUnsubscribed, EventKind, LifecycleEvent, PacketProcessed, PacketType, TopicFilter,
};
pub use registry::{HookRegistry, LifecycleListener};
