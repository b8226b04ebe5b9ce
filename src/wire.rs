//! Channel wire format (Phoenix serializer v2).
//!
//! Frames travel as JSON arrays inside websocket text messages:
//! `[join_ref, ref, topic, event, payload]`. The two refs are optional
//! string counters; `ref` identifies a push so its reply can be matched,
//! and `join_ref` is the ref of the channel's join push, echoed on every
//! frame sent on that topic afterwards.

use serde_json::{json, Map, Value};

/// Join a channel topic.
pub const EVENT_JOIN: &str = "phx_join";
/// Leave a channel topic.
pub const EVENT_LEAVE: &str = "phx_leave";
/// Server reply to a push; payload is `{"status": ..., "response": ...}`.
pub const EVENT_REPLY: &str = "phx_reply";
/// The channel process crashed server-side.
pub const EVENT_ERROR: &str = "phx_error";
/// The channel was closed server-side.
pub const EVENT_CLOSE: &str = "phx_close";
/// Keepalive push on the reserved [`TOPIC_PHOENIX`] topic.
pub const EVENT_HEARTBEAT: &str = "heartbeat";

/// Reserved topic carrying socket-level heartbeats.
pub const TOPIC_PHOENIX: &str = "phoenix";
/// The shared entry-point topic that hands out room assignments.
pub const TOPIC_LOBBY: &str = "room:lobby";

static NULL: Value = Value::Null;

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text is not valid JSON.
    #[error("failed to decode frame JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON is not a 5-element array.
    #[error("frame is not a 5-element array")]
    Shape,
    /// A positional field has the wrong type.
    #[error("frame field `{0}` has the wrong type")]
    Field(&'static str),
}

/// One message on the channel wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Ref of the join push that opened this frame's topic, if any.
    pub join_ref: Option<String>,
    /// Ref of this push, used to correlate its reply.
    pub msg_ref: Option<String>,
    /// Channel topic, e.g. `"room:4000"`.
    pub topic: String,
    /// Event name: a control event (`phx_*`) or an application event.
    pub event: String,
    /// Arbitrary JSON payload.
    pub payload: Value,
}

/// Outcome carried by a `phx_reply` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
}

impl Frame {
    /// Build a join push. The push ref doubles as the channel's join_ref.
    pub fn join(topic: &str, payload: Value, join_ref: String) -> Self {
        Self {
            join_ref: Some(join_ref.clone()),
            msg_ref: Some(join_ref),
            topic: topic.to_owned(),
            event: EVENT_JOIN.to_owned(),
            payload,
        }
    }

    /// Build a leave push for a previously joined topic.
    pub fn leave(topic: &str, join_ref: String, msg_ref: String) -> Self {
        Self {
            join_ref: Some(join_ref),
            msg_ref: Some(msg_ref),
            topic: topic.to_owned(),
            event: EVENT_LEAVE.to_owned(),
            payload: Value::Object(Map::new()),
        }
    }

    /// Build an application event push on a joined topic.
    pub fn push(topic: &str, event: &str, payload: Value, join_ref: String, msg_ref: String) -> Self {
        Self {
            join_ref: Some(join_ref),
            msg_ref: Some(msg_ref),
            topic: topic.to_owned(),
            event: event.to_owned(),
            payload,
        }
    }

    /// Build a socket heartbeat push.
    pub fn heartbeat(msg_ref: String) -> Self {
        Self {
            join_ref: None,
            msg_ref: Some(msg_ref),
            topic: TOPIC_PHOENIX.to_owned(),
            event: EVENT_HEARTBEAT.to_owned(),
            payload: Value::Object(Map::new()),
        }
    }

    /// For `phx_reply` frames, the status and the response object.
    pub fn reply(&self) -> Option<(ReplyStatus, &Value)> {
        if self.event != EVENT_REPLY {
            return None;
        }
        let status = match self.payload.get("status").and_then(Value::as_str) {
            Some("ok") => ReplyStatus::Ok,
            Some("error") => ReplyStatus::Error,
            _ => return None,
        };
        Some((status, self.payload.get("response").unwrap_or(&NULL)))
    }
}

/// Topic of the per-room channel for an assigned room identifier.
pub fn room_topic(port: &str) -> String {
    format!("room:{port}")
}

/// Encode a frame as websocket text.
pub fn encode_frame(frame: &Frame) -> String {
    json!([
        frame.join_ref,
        frame.msg_ref,
        frame.topic,
        frame.event,
        frame.payload,
    ])
    .to_string()
}

/// Decode websocket text into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON, [`CodecError::Shape`]
/// for a non-array or wrong-arity frame, and [`CodecError::Field`] when a
/// positional field has the wrong type.
pub fn decode_frame(text: &str) -> Result<Frame, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(CodecError::Shape);
    };
    let [join_ref, msg_ref, topic, event, payload]: [Value; 5] =
        items.try_into().map_err(|_| CodecError::Shape)?;

    Ok(Frame {
        join_ref: opt_string(join_ref).ok_or(CodecError::Field("join_ref"))?,
        msg_ref: opt_string(msg_ref).ok_or(CodecError::Field("ref"))?,
        topic: req_string(topic).ok_or(CodecError::Field("topic"))?,
        event: req_string(event).ok_or(CodecError::Field("event"))?,
        payload,
    })
}

fn opt_string(value: Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s)),
        _ => None,
    }
}

fn req_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lobby_ok_reply() {
        let text = r#"["1","1","room:lobby","phx_reply",{"status":"ok","response":{"port":"4000","token":"abc"}}]"#;
        let frame = decode_frame(text).unwrap();
        assert_eq!(frame.topic, TOPIC_LOBBY);
        assert_eq!(frame.event, EVENT_REPLY);
        assert_eq!(frame.msg_ref.as_deref(), Some("1"));

        let (status, response) = frame.reply().unwrap();
        assert_eq!(status, ReplyStatus::Ok);
        assert_eq!(response["port"], "4000");
        assert_eq!(response["token"], "abc");
    }

    #[test]
    fn test_decode_error_reply() {
        let text = r#"["1","1","room:lobby","phx_reply",{"status":"error","response":{"reason":"full"}}]"#;
        let frame = decode_frame(text).unwrap();
        let (status, response) = frame.reply().unwrap();
        assert_eq!(status, ReplyStatus::Error);
        assert_eq!(response["reason"], "full");
    }

    #[test]
    fn test_decode_room_event_with_null_refs() {
        let text = r#"[null,null,"room:4000","new_msg",{"message":"hi"}]"#;
        let frame = decode_frame(text).unwrap();
        assert_eq!(frame.join_ref, None);
        assert_eq!(frame.msg_ref, None);
        assert_eq!(frame.event, "new_msg");
        assert_eq!(frame.payload["message"], "hi");
        assert!(frame.reply().is_none());
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(matches!(decode_frame("not json"), Err(CodecError::Json(_))));
        assert!(matches!(decode_frame(r#"{"a":1}"#), Err(CodecError::Shape)));
        assert!(matches!(
            decode_frame(r#"["1","1","room:lobby","phx_join"]"#),
            Err(CodecError::Shape)
        ));
        assert!(matches!(
            decode_frame(r#"["1","1",42,"phx_join",{}]"#),
            Err(CodecError::Field("topic"))
        ));
        assert!(matches!(
            decode_frame(r#"[7,"1","room:lobby","phx_join",{}]"#),
            Err(CodecError::Field("join_ref"))
        ));
    }

    #[test]
    fn test_encode_join_frame_shape() {
        let frame = Frame::join(TOPIC_LOBBY, serde_json::json!({}), "1".to_string());
        let text = encode_frame(&frame);
        assert_eq!(text, r#"["1","1","room:lobby","phx_join",{}]"#);
    }

    #[test]
    fn test_encode_decode_push() {
        let frame = Frame::push(
            "room:4000",
            "new_msg",
            serde_json::json!({"message": "hello"}),
            "2".to_string(),
            "5".to_string(),
        );
        let decoded = decode_frame(&encode_frame(&frame)).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_reply_without_status_is_none() {
        let frame = Frame {
            join_ref: None,
            msg_ref: Some("3".into()),
            topic: TOPIC_LOBBY.into(),
            event: EVENT_REPLY.into(),
            payload: serde_json::json!({"response": {}}),
        };
        assert!(frame.reply().is_none());
    }

    #[test]
    fn test_room_topic() {
        assert_eq!(room_topic("4000"), "room:4000");
    }
}
