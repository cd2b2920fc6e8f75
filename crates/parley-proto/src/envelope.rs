//! Versioned JSON envelope.
//!
//! Every frame is one JSON object with a version field `v` and a variant tag
//! `type`:
//!
//! ```text
//! {"v":1,"type":"broadcast","sender":"bob","text":"hi"}
//! {"v":1,"type":"system","text":"Server restarting"}
//! {"v":1,"type":"user_list","names":["alice","bob"]}
//! {"v":1,"type":"chat","text":"hi"}
//! {"v":1,"type":"list_users"}
//! ```
//!
//! The first three flow server to client, the last two client to server.
//!
//! # Invariants
//!
//! - The version is checked before the body is parsed, so a future version
//!   with a different body layout reports [`ProtocolError::UnsupportedVersion`]
//!   rather than a confusing decode error.
//! - Self-echo detection compares the `sender` field with the local identity
//!   exactly. Message text is never inspected.

use serde::{Deserialize, Serialize};

use crate::{ChatMessage, ENVELOPE_VERSION, OutboundMessage, ProtocolError, Result};

/// One envelope on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Envelope version.
    pub v: u8,
    /// Tagged message body.
    #[serde(flatten)]
    pub body: Body,
}

/// Envelope body, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    /// Chat line relayed by the server.
    Broadcast {
        /// Author of the message.
        sender: String,
        /// Message text.
        text: String,
    },
    /// Server-originated notice.
    System {
        /// Notice text.
        text: String,
    },
    /// Connected-user list reply.
    UserList {
        /// Connected user names.
        names: Vec<String>,
    },
    /// Chat line sent by the client.
    Chat {
        /// Message text.
        text: String,
    },
    /// User-list request sent by the client.
    ListUsers,
}

impl Body {
    fn kind(&self) -> &'static str {
        match self {
            Self::Broadcast { .. } => "broadcast",
            Self::System { .. } => "system",
            Self::UserList { .. } => "user_list",
            Self::Chat { .. } => "chat",
            Self::ListUsers => "list_users",
        }
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    v: u8,
}

impl Envelope {
    /// Wrap a body in an envelope of the current version.
    pub fn new(body: Body) -> Self {
        Self { v: ENVELOPE_VERSION, body }
    }

    /// Parse an envelope, rejecting unknown versions.
    pub fn decode(payload: &str) -> Result<Self> {
        let probe: VersionProbe = serde_json::from_str(payload)?;
        if probe.v != ENVELOPE_VERSION {
            return Err(ProtocolError::UnsupportedVersion(probe.v));
        }
        Ok(serde_json::from_str(payload)?)
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Decode a server envelope into a classified message.
pub fn classify(payload: &str, identity: &str) -> Result<ChatMessage> {
    let envelope = Envelope::decode(payload)?;
    match envelope.body {
        Body::Broadcast { sender, text } => {
            let text = format!("({sender}){text}");
            if sender == identity {
                Ok(ChatMessage::SelfEcho { text })
            } else {
                Ok(ChatMessage::PlainBroadcast { text })
            }
        },
        Body::System { text } => Ok(ChatMessage::SystemNotice { text: format!("(System){text}") }),
        Body::UserList { names } => Ok(ChatMessage::UserListReply {
            names: names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect(),
        }),
        body @ (Body::Chat { .. } | Body::ListUsers) => {
            Err(ProtocolError::UnexpectedKind { kind: body.kind() })
        },
    }
}

/// Encode an outbound message as an envelope.
pub fn encode(message: &OutboundMessage) -> Result<String> {
    let body = match message {
        OutboundMessage::Chat(text) => Body::Chat { text: text.clone() },
        OutboundMessage::ListUsers => Body::ListUsers,
    };
    Envelope::new(body).encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_encodes_with_version_and_tag() {
        let json = encode(&OutboundMessage::Chat("hi".into())).unwrap();
        assert_eq!(json, r#"{"v":1,"type":"chat","text":"hi"}"#);

        let json = encode(&OutboundMessage::ListUsers).unwrap();
        assert_eq!(json, r#"{"v":1,"type":"list_users"}"#);
    }

    #[test]
    fn broadcast_from_self_is_echo() {
        let msg = classify(r#"{"v":1,"type":"broadcast","sender":"alice","text":"hi"}"#, "alice")
            .unwrap();
        assert_eq!(msg, ChatMessage::SelfEcho { text: "(alice)hi".into() });
    }

    #[test]
    fn marker_text_does_not_fool_envelope() {
        let msg = classify(
            r#"{"v":1,"type":"broadcast","sender":"bob","text":"(alice) SystemDisplay(System)"}"#,
            "alice",
        )
        .unwrap();
        assert!(matches!(msg, ChatMessage::PlainBroadcast { .. }));
    }

    #[test]
    fn system_and_user_list() {
        let msg = classify(r#"{"v":1,"type":"system","text":"Server restarting"}"#, "a").unwrap();
        assert_eq!(msg, ChatMessage::SystemNotice { text: "(System)Server restarting".into() });

        let msg =
            classify(r#"{"v":1,"type":"user_list","names":[" alice","bob ",""]}"#, "a").unwrap();
        assert_eq!(msg, ChatMessage::UserListReply { names: vec!["alice".into(), "bob".into()] });
    }

    #[test]
    fn unknown_version_rejected() {
        let err = classify(r#"{"v":9,"type":"whatever"}"#, "a").unwrap_err();
        assert_eq!(err, ProtocolError::UnsupportedVersion(9));
    }

    #[test]
    fn client_kinds_rejected_inbound() {
        let err = classify(r#"{"v":1,"type":"list_users"}"#, "a").unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedKind { kind: "list_users" });
    }

    #[test]
    fn plain_text_is_decode_error() {
        assert!(matches!(classify("hello", "a"), Err(ProtocolError::Decode(_))));
    }
}
