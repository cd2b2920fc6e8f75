//! WebSocket transport.
//!
//! Thin wrapper around `tokio-tungstenite` implementing [`Connector`],
//! [`FrameSink`] and [`FrameStream`]. The stream is split once after the
//! handshake so the inbound pump can block on a read while the outbound pump
//! writes.
//!
//! Ping and pong frames never reach the session: tungstenite answers pings
//! itself and the reader skips both.

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        error::ProtocolError,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

use crate::{
    config::Endpoint,
    error::TransportError,
    transport::{CLOSE_NO_STATUS, Connector, Frame, FrameSink, FrameStream},
};

/// Concrete WebSocket stream type.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects over `ws://` or `wss://`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WebSocketWriter {
    sink: SplitSink<WsStream, Message>,
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WebSocketReader {
    stream: SplitStream<WsStream>,
}

impl Connector for WebSocketConnector {
    type Sink = WebSocketWriter;
    type Stream = WebSocketReader;

    async fn connect(
        &self,
        endpoint: &Endpoint,
    ) -> Result<(Self::Sink, Self::Stream), TransportError> {
        let request = endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        let (ws_stream, response) =
            tokio_tungstenite::connect_async(request).await.map_err(|e| match e {
                tungstenite::Error::Url(e) => TransportError::InvalidEndpoint(e.to_string()),
                other => TransportError::Connect(other.to_string()),
            })?;
        tracing::debug!(status = %response.status(), "websocket handshake complete");

        let (sink, stream) = ws_stream.split();
        Ok((WebSocketWriter { sink }, WebSocketReader { stream }))
    }
}

impl FrameSink for WebSocketWriter {
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        let message = match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(data) => Message::Binary(data),
            Frame::Close { code, reason } => {
                Message::Close(Some(CloseFrame { code: CloseCode::from(code), reason: reason.into() }))
            },
        };

        self.sink.send(message).await.map_err(|e| match e {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::SendAfterClosing) => TransportError::Closed,
            other => TransportError::Send(other.to_string()),
        })
    }
}

impl FrameStream for WebSocketReader {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.to_string()))),
                Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data.to_vec()))),
                Ok(Message::Close(close_frame)) => {
                    let (code, reason) = close_frame
                        .map_or((CLOSE_NO_STATUS, String::new()), |cf| {
                            (cf.code.into(), cf.reason.to_string())
                        });
                    return Some(Ok(Frame::Close { code, reason }));
                },
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {},
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
    }
}
