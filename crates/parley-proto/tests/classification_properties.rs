//! Property-based tests for inbound classification.
//!
//! These verify the classification rules hold for arbitrary payloads, not
//! just the handful of server strings seen in practice.

use parley_proto::{ChatMessage, Codec, WireFormat, legacy};
use proptest::prelude::*;

/// Identities the server would accept: no parentheses, no commas.
fn identity() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,16}"
}

/// Free text that cannot contain the user-list marker by accident.
fn chat_text() -> impl Strategy<Value = String> {
    "[a-z ()!?.]{0,64}"
}

/// Names as they appear in a user-list reply, with stray padding.
fn padded_names() -> impl Strategy<Value = Vec<(String, String, String)>> {
    prop::collection::vec(("[ \t]{0,3}", "[a-zA-Z0-9_]{1,12}", "[ \t]{0,3}"), 0..12)
}

proptest! {
    #[test]
    fn prop_self_tag_never_broadcast(
        id in identity(),
        before in chat_text(),
        after in chat_text(),
    ) {
        let payload = format!("{before}({id}){after}");
        let msg = legacy::classify(&payload, &id);

        // PROPERTY: a payload carrying our tag is self-authored
        prop_assert!(
            matches!(msg, ChatMessage::SelfEcho { .. }),
            "expected SelfEcho for {payload:?}, got {msg:?}"
        );
    }

    #[test]
    fn prop_user_list_count_and_trim(id in identity(), names in padded_names()) {
        let list = names
            .iter()
            .map(|(lead, name, trail)| format!("{lead}{name}{trail}"))
            .collect::<Vec<_>>()
            .join(",");
        let payload = format!("(System)ConnectedUserList: {list}");

        let msg = legacy::classify(&payload, &id);
        let ChatMessage::UserListReply { names: parsed } = msg else {
            return Err(TestCaseError::fail(format!("not a user list: {payload:?}")));
        };

        // PROPERTY: one entry per name, each trimmed
        prop_assert_eq!(parsed.len(), names.len());
        for (parsed, (_, expected, _)) in parsed.iter().zip(&names) {
            prop_assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn prop_system_notice_keeps_body(id in identity(), body in "[a-z .!]{0,64}") {
        let payload = format!("SystemDisplay(System){body}");
        let msg = legacy::classify(&payload, &id);

        // PROPERTY: prefix stripped, body untouched
        prop_assert_eq!(msg, ChatMessage::SystemNotice { text: format!("(System){body}") });
    }

    #[test]
    fn prop_envelope_self_echo_by_sender_only(
        id in identity(),
        other in identity(),
        text in chat_text(),
    ) {
        let codec = Codec::new(WireFormat::Envelope, id.clone());
        let frame = format!(
            r#"{{"v":1,"type":"broadcast","sender":"{other}","text":"{text}"}}"#
        );
        let msg = codec.decode(&frame).map_err(|e| TestCaseError::fail(e.to_string()))?;

        // PROPERTY: self-echo iff sender equals identity
        prop_assert_eq!(matches!(msg, ChatMessage::SelfEcho { .. }), other == id);
    }
}
