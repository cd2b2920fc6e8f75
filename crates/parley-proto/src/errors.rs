//! Protocol errors.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire messages.
///
/// The legacy text format cannot fail to decode: every string classifies as
/// something. These errors only arise from the envelope format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload is not a well-formed envelope.
    #[error("envelope decode failed: {0}")]
    Decode(String),

    /// Envelope could not be serialized.
    #[error("envelope encode failed: {0}")]
    Encode(String),

    /// Envelope carries a version this client does not understand.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    /// Envelope variant is valid but only flows the other direction.
    #[error("unexpected {kind} envelope from server")]
    UnexpectedKind {
        /// Variant tag that was received.
        kind: &'static str,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
