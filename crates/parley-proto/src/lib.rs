//! Wire conventions for the parley chat client.
//!
//! The chat server speaks unstructured UTF-8 text frames. Any structure is
//! convention only: a literal tag marks system messages, another marks the
//! connected-user list reply, and the server echoes a sender's own messages
//! with the sender name in parentheses. This crate turns those conventions
//! into a typed [`ChatMessage`] so the rest of the client never inspects raw
//! substrings.
//!
//! Two wire formats are supported:
//!
//! - [`WireFormat::Legacy`]: byte-compatible with the existing server.
//!   Classification is by substring inspection and is inherently ambiguous (a
//!   broadcast that happens to contain a marker is misclassified).
//! - [`WireFormat::Envelope`]: a versioned JSON envelope with an explicit
//!   variant tag. The sender is a field, so self-echo detection compares
//!   identities instead of searching text.
//!
//! # Components
//!
//! - [`ChatMessage`]: Classified inbound message
//! - [`OutboundMessage`]: Messages the client sends
//! - [`legacy`]: Substring classification and plain-text encoding
//! - [`envelope`]: Versioned envelope types
//! - [`Codec`]: Format-dispatching encoder/decoder bound to an identity

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
pub mod envelope;
mod errors;
pub mod legacy;
mod message;

pub use codec::{Codec, WireFormat};
pub use errors::{ProtocolError, Result};
pub use message::{ChatMessage, OutboundMessage};

/// Request string that asks the server for the connected-user list.
pub const USER_LIST_REQUEST: &str = "getConnectedUsers";

/// Marker that identifies a server-originated system message.
pub const SYSTEM_DISPLAY_MARKER: &str = "SystemDisplay(System)";

/// Prefix stripped from system messages before display.
///
/// Only this part of [`SYSTEM_DISPLAY_MARKER`] is removed; the `(System)` tag
/// stays in the rendered text.
pub const SYSTEM_DISPLAY_PREFIX: &str = "SystemDisplay";

/// Marker that identifies a connected-user list reply.
pub const USER_LIST_MARKER: &str = "ConnectedUserList";

/// Header stripped from a user-list reply before splitting on commas.
pub const USER_LIST_HEADER: &str = "(System)ConnectedUserList: ";

/// Current envelope version.
pub const ENVELOPE_VERSION: u8 = 1;
