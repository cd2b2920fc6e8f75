//! Error types for the parley client.
//!
//! Strongly-typed errors per layer: transport errors (network failures),
//! session errors (state machine violations) and the client taxonomy the
//! controller uses to decide between prompting for reconnection and
//! reporting.

use thiserror::Error;

use crate::session::SessionState;

/// Errors raised by a transport implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Handshake with the server failed (refused, DNS, TLS, HTTP upgrade).
    #[error("connection failed: {0}")]
    Connect(String),

    /// Endpoint could not be turned into a request.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(String),

    /// Connection is already closed.
    #[error("connection closed")]
    Closed,
}

/// Errors from session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidTransition {
        /// State when the transition was attempted
        state: SessionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Operation needs an open session.
    #[error("session is not open (state {0:?})")]
    NotOpen(SessionState),

    /// Underlying transport error
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures the connection controller reports to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transport-level failure while connecting.
    #[error("failed to connect: {0}")]
    ConnectFailure(String),

    /// A live session was aborted by the transport.
    #[error("connection lost")]
    TransportAborted,

    /// Any other failure during the connect phase.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Returns true if the user should be offered a reconnect.
    ///
    /// `Unexpected` failures follow [`crate::FailurePolicy`] instead.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ConnectFailure(_) | Self::TransportAborted)
    }
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transport(TransportError::Connect(reason)) => Self::ConnectFailure(reason),
            SessionError::Transport(
                TransportError::Send(_) | TransportError::Receive(_) | TransportError::Closed,
            ) => Self::TransportAborted,
            other => Self::Unexpected(other.to_string()),
        }
    }
}
