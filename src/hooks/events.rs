//! Broker lifecycle events
//!
//! Payloads mirrored to the notification channel when clients connect,
//! disconnect, publish, subscribe, unsubscribe, or have a packet processed.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Kind of lifecycle event, serialized as its channel event name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "MqttClientConnected")]
    Connected,
    #[serde(rename = "MqttClientDisconnected")]
    Disconnected,
    #[serde(rename = "MqttClientPublished")]
    Published,
    #[serde(rename = "MqttClientSubscribed")]
    Subscribed,
    #[serde(rename = "MqttClientUnsubscribed")]
    Unsubscribed,
    #[serde(rename = "MqttPacketProcessed")]
    PacketProcessed,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Connected,
        EventKind::Disconnected,
        EventKind::Published,
        EventKind::Subscribed,
        EventKind::Unsubscribed,
        EventKind::PacketProcessed,
    ];

    /// Channel event name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "MqttClientConnected",
            EventKind::Disconnected => "MqttClientDisconnected",
            EventKind::Published => "MqttClientPublished",
            EventKind::Subscribed => "MqttClientSubscribed",
            EventKind::Unsubscribed => "MqttClientUnsubscribed",
            EventKind::PacketProcessed => "MqttPacketProcessed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details the broker hands to every hook
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// MQTT client identifier
    pub id: String,
    /// Remote address of the connection
    pub remote: String,
}

impl ClientInfo {
    pub fn new(id: &str, remote: &str) -> Self {
        Self {
            id: id.to_string(),
            remote: remote.to_string(),
        }
    }
}

/// Topic filter from a SUBSCRIBE or UNSUBSCRIBE packet
#[derive(Debug, Clone)]
pub struct TopicFilter {
    pub filter: String,
    pub qos: u8,
}

/// MQTT control packet type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
}

impl TryFrom<u8> for PacketType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => PacketType::Connect,
            2 => PacketType::ConnAck,
            3 => PacketType::Publish,
            4 => PacketType::PubAck,
            5 => PacketType::PubRec,
            6 => PacketType::PubRel,
            7 => PacketType::PubComp,
            8 => PacketType::Subscribe,
            9 => PacketType::SubAck,
            10 => PacketType::Unsubscribe,
            11 => PacketType::UnsubAck,
            12 => PacketType::PingReq,
            13 => PacketType::PingResp,
            14 => PacketType::Disconnect,
            other => return Err(other),
        })
    }
}

// Numeric on the wire
impl Serialize for PacketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

// ============================================================================
// Event payloads
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ClientConnected {
    pub id: String,
    pub protocol_version: u8,
    pub username: String,
    pub remote: String,
    pub qos: u8,
    pub keep_alive: u16,
    pub timestamp: u64,
}

impl ClientConnected {
    pub fn new(client: &ClientInfo, protocol_version: u8, username: &str, qos: u8, keep_alive: u16) -> Self {
        Self {
            id: client.id.clone(),
            protocol_version,
            username: username.to_string(),
            remote: client.remote.clone(),
            qos,
            keep_alive,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientDisconnected {
    pub id: String,
    pub timestamp: u64,
}

impl ClientDisconnected {
    pub fn new(client: &ClientInfo) -> Self {
        Self {
            id: client.id.clone(),
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientPublished {
    pub id: String,
    pub topic_name: String,
    pub payload: String,
    pub qos: u8,
    pub retain: bool,
    pub timestamp: u64,
}

impl ClientPublished {
    /// Non-UTF-8 payload bytes are replaced, not rejected
    pub fn new(client: &ClientInfo, topic_name: &str, payload: &[u8], qos: u8, retain: bool) -> Self {
        Self {
            id: client.id.clone(),
            topic_name: topic_name.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            qos,
            retain,
            timestamp: now_millis(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSubscribed {
    pub id: String,
    pub topic_name: String,
    pub qos: u8,
    pub timestamp: u64,
}

impl ClientSubscribed {
    /// Only the first filter is reported; `None` when there are none
    pub fn from_filters(client: &ClientInfo, filters: &[TopicFilter]) -> Option<Self> {
        let first = filters.first()?;
        Some(Self {
            id: client.id.clone(),
            topic_name: first.filter.clone(),
            qos: first.qos,
            timestamp: now_millis(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientUnsubscribed {
    pub id: String,
    pub topic_name: String,
    pub timestamp: u64,
}

impl ClientUnsubscribed {
    /// Only the first filter is reported; `None` when there are none
    pub fn from_filters(client: &ClientInfo, filters: &[TopicFilter]) -> Option<Self> {
        let first = filters.first()?;
        Some(Self {
            id: client.id.clone(),
            topic_name: first.filter.clone(),
            timestamp: now_millis(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PacketProcessed {
    pub id: String,
    pub packet_id: u16,
    pub packet_type: PacketType,
    pub packet_length: u32,
    pub timestamp: u64,
}

impl PacketProcessed {
    pub fn new(client: &ClientInfo, packet_id: u16, packet_type: PacketType, packet_length: u32) -> Self {
        Self {
            id: client.id.clone(),
            packet_id,
            packet_type,
            packet_length,
            timestamp: now_millis(),
        }
    }
}

/// Any lifecycle event; serializes as the bare payload
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LifecycleEvent {
    Connected(ClientConnected),
    Disconnected(ClientDisconnected),
    Published(ClientPublished),
    Subscribed(ClientSubscribed),
    Unsubscribed(ClientUnsubscribed),
    PacketProcessed(PacketProcessed),
}

impl LifecycleEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Connected(_) => EventKind::Connected,
            LifecycleEvent::Disconnected(_) => EventKind::Disconnected,
            LifecycleEvent::Published(_) => EventKind::Published,
            LifecycleEvent::Subscribed(_) => EventKind::Subscribed,
            LifecycleEvent::Unsubscribed(_) => EventKind::Unsubscribed,
            LifecycleEvent::PacketProcessed(_) => EventKind::PacketProcessed,
        }
    }

    /// Client the event belongs to
    pub fn client_id(&self) -> &str {
        match self {
            LifecycleEvent::Connected(e) => &e.id,
            LifecycleEvent::Disconnected(e) => &e.id,
            LifecycleEvent::Published(e) => &e.id,
            LifecycleEvent::Subscribed(e) => &e.id,
            LifecycleEvent::Unsubscribed(e) => &e.id,
            LifecycleEvent::PacketProcessed(e) => &e.id,
        }
    }

    /// Copy of the event with any message payload blanked out
    pub fn redacted(&self) -> LifecycleEvent {
        match self {
            LifecycleEvent::Published(e) => LifecycleEvent::Published(ClientPublished {
                payload: String::new(),
                ..e.clone()
            }),
            other => other.clone(),
        }
    }
}

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> ClientInfo {
        ClientInfo::new("dev-1", "10.0.0.5:51234")
    }

    #[test]
    fn test_event_kind_names() {
        assert_eq!(serde_json::to_value(EventKind::Connected).unwrap(), json!("MqttClientConnected"));
        assert_eq!(serde_json::to_value(EventKind::PacketProcessed).unwrap(), json!("MqttPacketProcessed"));
        for kind in EventKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
    }

    #[test]
    fn test_connected_payload_shape() {
        let event = ClientConnected::new(&client(), 4, "alice", 2, 60);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["id"], "dev-1");
        assert_eq!(value["protocol_version"], 4);
        assert_eq!(value["username"], "alice");
        assert_eq!(value["remote"], "10.0.0.5:51234");
        assert_eq!(value["qos"], 2);
        assert_eq!(value["keep_alive"], 60);
        assert!(value["timestamp"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_published_lossy_payload() {
        let event = ClientPublished::new(&client(), "sensors/temp", &[b'2', b'1', 0xff], 1, true);
        assert_eq!(event.payload, "21\u{fffd}");
        assert!(event.retain);
    }

    #[test]
    fn test_subscribed_uses_first_filter() {
        let filters = vec![
            TopicFilter {
                filter: "sensors/#".to_string(),
                qos: 1,
            },
            TopicFilter {
                filter: "alerts/+".to_string(),
                qos: 2,
            },
        ];

        let event = ClientSubscribed::from_filters(&client(), &filters).unwrap();
        assert_eq!(event.topic_name, "sensors/#");
        assert_eq!(event.qos, 1);

        assert!(ClientSubscribed::from_filters(&client(), &[]).is_none());
        assert!(ClientUnsubscribed::from_filters(&client(), &[]).is_none());
    }

    #[test]
    fn test_packet_type_serializes_as_number() {
        let event = PacketProcessed::new(&client(), 12, PacketType::Subscribe, 27);
        let value = serde_json::to_value(LifecycleEvent::PacketProcessed(event)).unwrap();

        assert_eq!(value["packet_type"], 8);
        assert_eq!(value["packet_id"], 12);
        assert_eq!(value["packet_length"], 27);
    }

    #[test]
    fn test_packet_type_from_u8() {
        assert_eq!(PacketType::try_from(1), Ok(PacketType::Connect));
        assert_eq!(PacketType::try_from(14), Ok(PacketType::Disconnect));
        assert_eq!(PacketType::try_from(0), Err(0));
        assert_eq!(PacketType::try_from(15), Err(15));
    }

    #[test]
    fn test_lifecycle_event_serializes_untagged() {
        let event = LifecycleEvent::Disconnected(ClientDisconnected::new(&client()));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(event.kind(), EventKind::Disconnected);
        assert_eq!(event.client_id(), "dev-1");
        assert_eq!(value.as_object().unwrap().len(), 2);
        assert_eq!(value["id"], "dev-1");
    }

    #[test]
    fn test_redacted_blanks_publish_payload() {
        let event = LifecycleEvent::Published(ClientPublished::new(&client(), "t", b"secret", 0, false));
        match event.redacted() {
            LifecycleEvent::Published(e) => {
                assert!(e.payload.is_empty());
                assert_eq!(e.topic_name, "t");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
