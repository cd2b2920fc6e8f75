//! Format-dispatching codec.

use std::{fmt, str::FromStr};

use crate::{ChatMessage, OutboundMessage, ProtocolError, Result, envelope, legacy};

/// Wire format spoken with the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WireFormat {
    /// Unstructured text classified by substring. Byte-compatible with the
    /// existing server.
    #[default]
    Legacy,
    /// Versioned JSON envelope with an explicit variant tag.
    Envelope,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Envelope => f.write_str("envelope"),
        }
    }
}

impl FromStr for WireFormat {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "envelope" => Ok(Self::Envelope),
            other => Err(ProtocolError::Decode(format!("unknown wire format: {other}"))),
        }
    }
}

/// Encoder/decoder bound to a wire format and the local identity.
///
/// The identity is fixed for the process lifetime, so one codec is built per
/// client and shared by both pumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    format: WireFormat,
    identity: String,
}

impl Codec {
    /// Create a codec for `identity` speaking `format`.
    pub fn new(format: WireFormat, identity: impl Into<String>) -> Self {
        Self { format, identity: identity.into() }
    }

    /// Wire format in use.
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Local identity used for self-echo detection.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Classify one inbound text payload.
    ///
    /// Never fails in [`WireFormat::Legacy`].
    pub fn decode(&self, payload: &str) -> Result<ChatMessage> {
        match self.format {
            WireFormat::Legacy => Ok(legacy::classify(payload, &self.identity)),
            WireFormat::Envelope => envelope::classify(payload, &self.identity),
        }
    }

    /// Encode an outbound message as one text frame.
    pub fn encode(&self, message: &OutboundMessage) -> Result<String> {
        match self.format {
            WireFormat::Legacy => Ok(legacy::encode(message)),
            WireFormat::Envelope => envelope::encode(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wire_format() {
        assert_eq!("legacy".parse::<WireFormat>().unwrap(), WireFormat::Legacy);
        assert_eq!("Envelope".parse::<WireFormat>().unwrap(), WireFormat::Envelope);
        assert!("json".parse::<WireFormat>().is_err());
    }

    #[test]
    fn legacy_codec_passes_text_through() {
        let codec = Codec::new(WireFormat::Legacy, "alice");
        assert_eq!(codec.encode(&OutboundMessage::Chat("hello".into())).unwrap(), "hello");
        assert_eq!(
            codec.decode("(alice)hello").unwrap(),
            ChatMessage::SelfEcho { text: "(alice)hello".into() }
        );
    }
}
