//! Socket Mode envelopes and their translation into [`Event`]s.

use {
    serde::Deserialize,
    serde_json::Value,
    teambot_channels::{Event, MessageEvent},
};

use crate::Result;

/// One frame received on the Socket Mode websocket.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    /// Present on frames that must be acknowledged.
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub payload: Option<Value>,
    /// Set on `disconnect` frames.
    #[serde(default)]
    pub reason: Option<String>,
}

/// What the socket task should do with one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAction {
    /// Acknowledgment to write back, as JSON text.
    pub ack: Option<String>,
    pub event: Option<Event>,
    /// Slack asked us to reconnect.
    pub reconnect: bool,
}

/// Decode a text frame into the ack, event and control action it implies.
pub fn route_frame(text: &str) -> Result<FrameAction> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let ack = envelope
        .envelope_id
        .as_ref()
        .map(|id| serde_json::json!({ "envelope_id": id }).to_string());

    let (event, reconnect) = match envelope.kind.as_str() {
        "disconnect" => (None, true),
        "events_api" => (envelope.payload.as_ref().and_then(event_from_payload), false),
        other => (Some(Event::other(other)), false),
    };

    Ok(FrameAction {
        ack,
        event,
        reconnect,
    })
}

/// Translate an Events API callback payload (`{"event": {...}}`).
pub fn event_from_payload(payload: &Value) -> Option<Event> {
    let inner = payload.get("event")?;
    let kind = inner.get("type")?.as_str()?;
    if kind != "message" {
        return Some(Event::other(kind));
    }

    let field = |name: &str| inner.get(name).and_then(Value::as_str);
    let channel = field("channel")?;
    let Some(sender) = field("user") else {
        return Some(Event::other(kind));
    };
    Some(Event::Message(MessageEvent {
        channel: channel.into(),
        sender: sender.into(),
        text: field("text").unwrap_or_default().into(),
        subtype: field("subtype").map(str::to_string),
    }))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn events_api(event: Value) -> String {
        json!({
            "type": "events_api",
            "envelope_id": "env-1",
            "payload": { "type": "event_callback", "event": event },
        })
        .to_string()
    }

    #[test]
    fn message_is_acked_and_translated() {
        let frame = events_api(json!({
            "type": "message",
            "channel": "D1",
            "user": "U1",
            "text": "help",
        }));

        let action = route_frame(&frame).unwrap();
        assert_eq!(action.ack.as_deref(), Some(r#"{"envelope_id":"env-1"}"#));
        assert_eq!(action.event, Some(Event::message("D1", "U1", "help")));
        assert!(!action.reconnect);
    }

    #[test]
    fn subtype_is_preserved() {
        let frame = events_api(json!({
            "type": "message",
            "subtype": "channel_join",
            "channel": "C1",
            "user": "U1",
            "text": "<@U1> has joined the channel",
        }));

        let Some(Event::Message(msg)) = route_frame(&frame).unwrap().event else {
            panic!("expected message");
        };
        assert_eq!(msg.subtype.as_deref(), Some("channel_join"));
    }

    #[test]
    fn bot_message_without_user_is_not_a_chat_message() {
        let frame = events_api(json!({
            "type": "message",
            "subtype": "bot_message",
            "channel": "C1",
            "bot_id": "B1",
            "text": "beep",
        }));

        let action = route_frame(&frame).unwrap();
        assert_eq!(action.ack.as_deref(), Some(r#"{"envelope_id":"env-1"}"#));
        assert_eq!(action.event, Some(Event::other("message")));
    }

    #[rstest]
    #[case(json!({"type": "reaction_added", "user": "U1"}), Some(Event::other("reaction_added")))]
    #[case(json!({"type": "message", "user": "U1"}), None)]
    #[case(json!({"user": "U1"}), None)]
    fn non_message_payloads(#[case] event: Value, #[case] expected: Option<Event>) {
        assert_eq!(route_frame(&events_api(event)).unwrap().event, expected);
    }

    #[test]
    fn hello_becomes_other_event() {
        let action = route_frame(r#"{"type":"hello","num_connections":1}"#).unwrap();
        assert_eq!(action.ack, None);
        assert_eq!(action.event, Some(Event::other("hello")));
    }

    #[test]
    fn disconnect_requests_reconnect() {
        let action =
            route_frame(r#"{"type":"disconnect","reason":"refresh_requested"}"#).unwrap();
        assert!(action.reconnect);
        assert_eq!(action.event, None);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(route_frame("not json").is_err());
    }
}
