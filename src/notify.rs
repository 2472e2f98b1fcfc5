//! Lifecycle event notification relay
//!
//! Mirrors broker lifecycle events to an external channel. The transport that
//! carries envelopes off-process is up to the embedder; this module provides
//! the [`Notifier`] seam, a tracing sink, and an in-process channel.

use crate::hooks::{EventKind, LifecycleEvent, LifecycleListener};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

/// Channel name carried in every envelope
pub const CHANNEL: &str = "mqtt";

/// Default queue depth for [`ChannelNotifier`]
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Outbound notification capability
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: EventKind, payload: serde_json::Value);
}

/// Envelope sent for each notification
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub channel: &'a str,
    pub event: EventKind,
    pub data: serde_json::Value,
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: EventKind, payload: serde_json::Value) {
        info!(event = %kind, data = %payload, "Lifecycle notification");
    }
}

/// Notifier that queues serialized envelopes for a forwarding task
///
/// The queue is bounded. When the forwarder falls behind, new events are
/// dropped with a warning instead of blocking the broker.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<String>,
}

impl ChannelNotifier {
    /// Create the notifier and the receiving end of its queue
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        // tokio panics on a zero capacity
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, kind: EventKind, payload: serde_json::Value) {
        let envelope = Envelope {
            channel: CHANNEL,
            event: kind,
            data: payload,
        };

        let message = match serde_json::to_string(&envelope) {
            Ok(m) => m,
            Err(e) => {
                warn!(event = %kind, error = %e, "Failed to serialize notification");
                return;
            }
        };

        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(event = %kind, "Notification queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(event = %kind, "Notification channel closed, dropping event");
            }
        }
    }
}

/// Lifecycle listener that forwards every event to a [`Notifier`]
pub struct NotifyListener {
    notifier: Arc<dyn Notifier>,
    include_payloads: bool,
}

impl NotifyListener {
    pub fn new(notifier: Arc<dyn Notifier>, include_payloads: bool) -> Self {
        Self {
            notifier,
            include_payloads,
        }
    }
}

impl LifecycleListener for NotifyListener {
    fn id(&self) -> &str {
        "notify-relay"
    }

    fn provides(&self) -> &[EventKind] {
        &EventKind::ALL
    }

    fn on_event(&self, event: &LifecycleEvent) {
        let event = if self.include_payloads {
            event.clone()
        } else {
            event.redacted()
        };

        match serde_json::to_value(&event) {
            Ok(payload) => self.notifier.notify(event.kind(), payload),
            Err(e) => warn!(event = %event.kind(), error = %e, "Failed to encode lifecycle event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{ClientConnected, ClientInfo, ClientPublished, HookRegistry};
    use serde_json::{json, Value};

    #[test]
    fn test_channel_envelope_shape() {
        let (notifier, mut rx) = ChannelNotifier::new(DEFAULT_QUEUE_CAPACITY);
        notifier.notify(EventKind::Disconnected, json!({"id": "dev-1", "timestamp": 5}));

        let message: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            message,
            json!({
                "channel": "mqtt",
                "event": "MqttClientDisconnected",
                "data": {"id": "dev-1", "timestamp": 5}
            })
        );
    }

    #[test]
    fn test_closed_channel_is_not_fatal() {
        let (notifier, rx) = ChannelNotifier::new(DEFAULT_QUEUE_CAPACITY);
        drop(rx);
        notifier.notify(EventKind::Connected, json!({}));
    }

    #[test]
    fn test_full_queue_drops_newest() {
        let (notifier, mut rx) = ChannelNotifier::new(2);
        for i in 0..5 {
            notifier.notify(EventKind::Connected, json!({"seq": i}));
        }

        let first: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        let second: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(first["data"]["seq"], 0);
        assert_eq!(second["data"]["seq"], 1);
        assert!(rx.try_recv().is_err());

        // Room again once the forwarder catches up
        notifier.notify(EventKind::Connected, json!({"seq": 9}));
        let next: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(next["data"]["seq"], 9);
    }

    #[test]
    fn test_listener_relays_through_registry() {
        let (notifier, mut rx) = ChannelNotifier::new(DEFAULT_QUEUE_CAPACITY);
        let registry = HookRegistry::new();
        registry.register(Arc::new(NotifyListener::new(Arc::new(notifier), true)));

        let client = ClientInfo::new("dev-1", "10.0.0.5:51234");
        registry.dispatch(&LifecycleEvent::Connected(ClientConnected::new(&client, 5, "alice", 1, 30)));
        registry.dispatch(&LifecycleEvent::Published(ClientPublished::new(
            &client,
            "sensors/temp",
            b"21.5",
            1,
            false,
        )));

        let connected: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(connected["event"], "MqttClientConnected");
        assert_eq!(connected["data"]["username"], "alice");
        assert_eq!(connected["data"]["keep_alive"], 30);

        let published: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(published["event"], "MqttClientPublished");
        assert_eq!(published["data"]["payload"], "21.5");
        assert_eq!(published["data"]["topic_name"], "sensors/temp");
    }

    #[test]
    fn test_listener_redacts_payloads() {
        let (notifier, mut rx) = ChannelNotifier::new(DEFAULT_QUEUE_CAPACITY);
        let listener = NotifyListener::new(Arc::new(notifier), false);

        let client = ClientInfo::new("dev-1", "10.0.0.5:51234");
        listener.on_event(&LifecycleEvent::Published(ClientPublished::new(
            &client, "t", b"secret", 0, false,
        )));

        let published: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(published["data"]["payload"], "");
    }
}
