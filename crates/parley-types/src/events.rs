use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events pushed from server to client over the WebSocket gateway.
///
/// This is a closed set: the wire names (`getOnlineUsers`, `newMessage`)
/// are part of the client contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Full snapshot of currently online user ids. Sent to every client
    /// whenever the presence registry changes; the client replaces its
    /// online set wholesale.
    #[serde(rename = "getOnlineUsers")]
    OnlineUsers(Vec<Uuid>),

    /// A message addressed to the receiving client was just persisted.
    /// Best-effort push — an offline receiver picks it up from history.
    #[serde(rename = "newMessage")]
    NewMessage(Message),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn online_users_wire_shape() {
        let event = GatewayEvent::OnlineUsers(vec![Uuid::nil()]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "getOnlineUsers");
        assert!(json["data"].is_array());
    }

    #[test]
    fn new_message_wire_shape() {
        let event = GatewayEvent::NewMessage(Message {
            id: Uuid::nil(),
            sender_id: Uuid::nil(),
            receiver_id: Uuid::nil(),
            text: Some("hi".into()),
            image: None,
            seen: false,
            created_at: DateTime::default(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "newMessage");
        assert_eq!(json["data"]["text"], "hi");
        assert_eq!(json["data"]["seen"], false);
    }

    #[test]
    fn events_round_trip() {
        let event = GatewayEvent::OnlineUsers(vec![Uuid::new_v4(), Uuid::new_v4()]);
        let text = serde_json::to_string(&event).unwrap();
        let back: GatewayEvent = serde_json::from_str(&text).unwrap();
        match back {
            GatewayEvent::OnlineUsers(ids) => assert_eq!(ids.len(), 2),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
