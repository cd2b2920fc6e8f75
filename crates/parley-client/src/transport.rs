//! Transport abstraction.
//!
//! The session layer never touches sockets directly. A [`Connector`] performs
//! the handshake and returns a split ([`FrameSink`], [`FrameStream`]) pair so
//! sending and receiving can progress independently.
//!
//! # Implementations
//!
//! - **WebSocket**: [`crate::websocket::WebSocketConnector`] (feature
//!   `websocket`), backed by `tokio-tungstenite`
//! - **Simulation**: in-memory channels from the `parley-harness` crate

use std::future::Future;

use crate::{config::Endpoint, error::TransportError};

/// Close code for a normal closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the peer sent no status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// One message unit on the duplex connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Binary payload. Decoded lossily as text by the inbound pump.
    Binary(Vec<u8>),
    /// Close frame.
    Close {
        /// Close status code.
        code: u16,
        /// Human-readable reason.
        reason: String,
    },
}

impl Frame {
    /// Normal-closure close frame with `reason`.
    pub fn close(reason: impl Into<String>) -> Self {
        Self::Close { code: CLOSE_NORMAL, reason: reason.into() }
    }
}

/// Write half of a connection.
pub trait FrameSink: Send + 'static {
    /// Send one complete frame.
    fn send(&mut self, frame: Frame) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Read half of a connection.
pub trait FrameStream: Send + 'static {
    /// Receive the next frame.
    ///
    /// Returns `None` when the connection ended without a close frame.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Frame, TransportError>>> + Send;
}

/// Opens connections.
pub trait Connector: Send + Sync + 'static {
    /// Write half produced by this connector.
    type Sink: FrameSink;
    /// Read half produced by this connector.
    type Stream: FrameStream;

    /// Perform the handshake with `endpoint`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Connect`] for network-level failures,
    /// [`TransportError::InvalidEndpoint`] if the endpoint cannot be used.
    fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> impl Future<Output = Result<(Self::Sink, Self::Stream), TransportError>> + Send;
}
