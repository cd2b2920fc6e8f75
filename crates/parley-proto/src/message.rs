//! Typed chat messages.

/// A classified inbound message.
///
/// Produced by the [`crate::Codec`] from one received text frame. The variant
/// decides how the presenter renders the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// Message from another user, broadcast to the room.
    PlainBroadcast {
        /// Display text.
        text: String,
    },

    /// The server echoing this client's own message back.
    SelfEcho {
        /// Display text.
        text: String,
    },

    /// Server-originated notice (joins, leaves, restarts).
    SystemNotice {
        /// Display text with the transport marker stripped.
        text: String,
    },

    /// Reply to a user-list request.
    UserListReply {
        /// Connected user names, trimmed, in server order.
        names: Vec<String>,
    },
}

impl ChatMessage {
    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlainBroadcast { .. } => "broadcast",
            Self::SelfEcho { .. } => "self_echo",
            Self::SystemNotice { .. } => "system",
            Self::UserListReply { .. } => "user_list",
        }
    }

    /// Display text. `None` for user-list replies, which render as a list.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::PlainBroadcast { text } | Self::SelfEcho { text } | Self::SystemNotice { text } => {
                Some(text)
            },
            Self::UserListReply { .. } => None,
        }
    }
}

/// A message the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// A line of chat typed by the user.
    Chat(String),

    /// Ask the server for the connected-user list.
    ListUsers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_none_only_for_user_list() {
        let system = ChatMessage::SystemNotice { text: "(System)hi".into() };
        assert_eq!(system.text(), Some("(System)hi"));

        let list = ChatMessage::UserListReply { names: vec!["a".into()] };
        assert_eq!(list.text(), None);
        assert_eq!(list.kind(), "user_list");
    }
}
