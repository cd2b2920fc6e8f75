//! Client configuration and endpoint construction.

use std::time::Duration;

use parley_proto::WireFormat;

use crate::context::Identity;

/// Server the original deployment listens on.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:6000/ws";

/// Bytes read per receive call. Larger payloads arrive in chunks.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 1024;

/// Interval between connect progress ticks.
pub const DEFAULT_CONNECT_TICK: Duration = Duration::from_secs(1);

/// Time allowed for the peer to acknowledge a close before giving up.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(3);

/// Time allowed for the connect handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// What the controller does after a non-transport failure while connecting.
///
/// Transport failures always prompt. For anything else (a malformed endpoint,
/// an internal error) the choice is explicit configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report, then ask whether to reconnect.
    #[default]
    Prompt,
    /// Report and retry immediately without asking.
    Retry,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base server URL. The identity is appended as `name=<identity>`.
    pub server_url: String,
    /// Wire format spoken with the server.
    pub wire_format: WireFormat,
    /// Bytes delivered per receive call.
    pub receive_buffer_size: usize,
    /// Progress tick interval while connecting.
    pub connect_tick: Duration,
    /// Connect handshake timeout. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Bounded wait for a close acknowledgement.
    pub close_grace: Duration,
    /// Handling of non-transport connect failures.
    pub on_unexpected_failure: FailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            wire_format: WireFormat::default(),
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            connect_tick: DEFAULT_CONNECT_TICK,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            close_grace: DEFAULT_CLOSE_GRACE,
            on_unexpected_failure: FailurePolicy::default(),
        }
    }
}

/// A fully-resolved server endpoint for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    /// Build the endpoint for `identity`, appending `name=<identity>` to the
    /// query string and keeping any existing parameters.
    pub fn for_identity(server_url: &str, identity: &Identity) -> Self {
        let (base, fragment) = match server_url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (server_url, None),
        };
        let separator = if !base.contains('?') {
            "?"
        } else if base.ends_with('?') || base.ends_with('&') {
            ""
        } else {
            "&"
        };

        let mut url = format!("{base}{separator}name={}", encode_query_value(identity.as_str()));
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }
        Self(url)
    }

    /// Endpoint URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Percent-encode a query value, keeping RFC 3986 unreserved characters.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte));
            },
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
