//! Legacy plain-text wire convention.
//!
//! Inbound frames are classified by substring inspection, in this order:
//!
//! 1. Contains [`USER_LIST_MARKER`]: user-list reply. The header is stripped
//!    and the remainder split on `,`.
//! 2. Contains `(<identity>)`: the server echoing our own message.
//! 3. Contains [`SYSTEM_DISPLAY_MARKER`]: system notice with
//!    [`SYSTEM_DISPLAY_PREFIX`] removed.
//! 4. Anything else: plain broadcast.
//!
//! The convention is ambiguous by construction. A user who types the literal
//! marker text produces a message every client misclassifies. Use
//! [`crate::WireFormat::Envelope`] when the server supports it.

use crate::{
    ChatMessage, OutboundMessage, SYSTEM_DISPLAY_MARKER, SYSTEM_DISPLAY_PREFIX, USER_LIST_HEADER,
    USER_LIST_MARKER, USER_LIST_REQUEST,
};

/// Tag the server embeds in messages authored by `identity`.
pub fn self_tag(identity: &str) -> String {
    format!("({identity})")
}

/// Classify one inbound text payload for the given local identity.
pub fn classify(payload: &str, identity: &str) -> ChatMessage {
    if payload.contains(USER_LIST_MARKER) {
        let body = if payload.contains(SYSTEM_DISPLAY_MARKER) {
            payload.replace(SYSTEM_DISPLAY_PREFIX, "")
        } else {
            payload.to_owned()
        };
        let body = body.replace(USER_LIST_HEADER, "");
        return ChatMessage::UserListReply { names: split_names(&body) };
    }

    if !identity.is_empty() && payload.contains(&self_tag(identity)) {
        return ChatMessage::SelfEcho { text: payload.to_owned() };
    }

    if payload.contains(SYSTEM_DISPLAY_MARKER) {
        return ChatMessage::SystemNotice { text: payload.replace(SYSTEM_DISPLAY_PREFIX, "") };
    }

    ChatMessage::PlainBroadcast { text: payload.to_owned() }
}

/// Split a comma-separated name list, trimming each entry.
///
/// Empty entries (from `"a,,b"`, a trailing comma or an empty list) are
/// dropped so the result holds exactly the names present.
pub fn split_names(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_owned).collect()
}

/// Encode an outbound message as plain text.
pub fn encode(message: &OutboundMessage) -> String {
    match message {
        OutboundMessage::Chat(text) => text.clone(),
        OutboundMessage::ListUsers => USER_LIST_REQUEST.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_echo_is_self_authored() {
        let msg = classify("(alice)hello", "alice");
        assert_eq!(msg, ChatMessage::SelfEcho { text: "(alice)hello".into() });
    }

    #[test]
    fn other_sender_is_broadcast() {
        let msg = classify("(bob)hello", "alice");
        assert_eq!(msg, ChatMessage::PlainBroadcast { text: "(bob)hello".into() });
    }

    #[test]
    fn system_marker_prefix_is_stripped() {
        let msg = classify("SystemDisplay(System)Server restarting", "alice");
        assert_eq!(msg, ChatMessage::SystemNotice { text: "(System)Server restarting".into() });
    }

    #[test]
    fn user_list_is_split_and_trimmed() {
        let msg = classify("(System)ConnectedUserList: alice, bob", "alice");
        assert_eq!(msg, ChatMessage::UserListReply { names: vec!["alice".into(), "bob".into()] });
    }

    #[test]
    fn user_list_with_system_prefix() {
        let msg = classify("SystemDisplay(System)ConnectedUserList: carol", "alice");
        assert_eq!(msg, ChatMessage::UserListReply { names: vec!["carol".into()] });
    }

    #[test]
    fn empty_user_list_has_no_names() {
        let msg = classify("(System)ConnectedUserList: ", "alice");
        assert_eq!(msg, ChatMessage::UserListReply { names: vec![] });
    }

    #[test]
    fn self_tag_wins_over_system_marker() {
        let msg = classify("SystemDisplay(System)(alice) joined", "alice");
        assert!(matches!(msg, ChatMessage::SelfEcho { .. }));
    }

    #[test]
    fn empty_identity_never_matches_self() {
        let msg = classify("()hi", "");
        assert!(matches!(msg, ChatMessage::PlainBroadcast { .. }));
    }

    #[test]
    fn encode_list_request() {
        assert_eq!(encode(&OutboundMessage::ListUsers), "getConnectedUsers");
        assert_eq!(encode(&OutboundMessage::Chat("hello".into())), "hello");
    }
}
