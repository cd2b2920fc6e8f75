//! Transport session state machine.
//!
//! One [`Session`] wraps one connection attempt. Sessions are never reused:
//! the controller builds a fresh one in [`SessionState::Disconnected`] for
//! every attempt and drops the old one first.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐   ok    ┌──────┐  peer close  ┌───────────────┐
//! │ Disconnected │────────>│ Connecting │────────>│ Open │─────────────>│ CloseReceived │
//! └──────────────┘         └────────────┘         └──────┘              └───────────────┘
//!                                │ error             │ │ close()              │ close()
//!                                ↓                   │ ↓                      ↓
//!                          ┌─────────┐   I/O error   │ ┌────────┐        ┌────────┐
//!                          │ Aborted │<──────────────┘ │ Closed │        │ Closed │
//!                          └─────────┘                 └────────┘        └────────┘
//! ```
//!
//! Closed and Aborted are terminal.
//!
//! # Concurrency
//!
//! After the handshake the connection is split. The [`SessionReader`] is
//! owned by the inbound pump. The write half sits behind a
//! `tokio::sync::Mutex` shared by every [`SessionWriter`] clone and by
//! [`Session::close`]: the outbound pump and the controller's close path both
//! write, and the transport does not allow two concurrent writes, so sends
//! are serialized. Reads never take the lock.
//!
//! State is held by a `watch` sender shared by the session and both halves.
//! Transitions go through `send_if_modified`, so the legality check and the
//! update happen under one lock.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::{
    config::Endpoint,
    error::{SessionError, TransportError},
    transport::{Connector, Frame, FrameSink, FrameStream},
};

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, no connection attempted.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Duplex exchange possible.
    Open,
    /// Peer initiated a close.
    CloseReceived,
    /// Graceful close completed locally.
    Closed,
    /// Failed unexpectedly.
    Aborted,
}

impl SessionState {
    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::{Aborted, CloseReceived, Closed, Connecting, Disconnected, Open};
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Open | Aborted)
                | (Open, CloseReceived | Closed | Aborted)
                | (CloseReceived, Closed | Aborted)
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Aborted)
    }

    /// Returns true if a close frame should be sent from this state.
    pub fn accepts_close(self) -> bool {
        matches!(self, Self::Open | Self::CloseReceived)
    }
}

/// Shared session state.
#[derive(Debug, Clone)]
pub(crate) struct StateHandle {
    tx: Arc<watch::Sender<SessionState>>,
}

impl StateHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Disconnected);
        Self { tx: Arc::new(tx) }
    }

    fn get(&self) -> SessionState {
        *self.tx.borrow()
    }

    /// Apply a transition, rejecting illegal ones without changing state.
    fn transition(&self, next: SessionState, operation: &'static str) -> Result<(), SessionError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                tracing::debug!(from = ?*state, to = ?next, operation, "session transition");
                *state = next;
                true
            } else {
                result = Err(SessionError::InvalidTransition { state: *state, operation });
                false
            }
        });
        result
    }

    /// Mark the session aborted unless it already reached a terminal state.
    ///
    /// A session we closed ourselves stays `Closed` when the peer then drops
    /// the connection.
    fn abort(&self) -> bool {
        self.transition(SessionState::Aborted, "abort").is_ok()
    }

    /// Record a peer-initiated close. A close arriving after our own close is
    /// the acknowledgement and leaves the session `Closed`.
    fn peer_closed(&self) {
        if self.get() == SessionState::Open {
            let _ = self.transition(SessionState::CloseReceived, "receive close");
        }
    }
}

/// One connection attempt.
///
/// Owned by the controller. Pumps hold a [`SessionReader`] or a
/// [`SessionWriter`] for the duration of the attempt.
pub struct Session<C: Connector> {
    attempt: u64,
    state: StateHandle,
    sink: Arc<Mutex<Option<C::Sink>>>,
}

impl<C: Connector> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("attempt", &self.attempt).field("state", &self.state()).finish()
    }
}

impl<C: Connector> Session<C> {
    /// Create a session in [`SessionState::Disconnected`].
    pub fn new(attempt: u64) -> Self {
        Self { attempt, state: StateHandle::new(), sink: Arc::new(Mutex::new(None)) }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Open the connection.
    ///
    /// On success the session is `Open` and the read half is returned for the
    /// inbound pump. On failure the session is `Aborted`.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` if this session was already used
    /// - `SessionError::Transport` if the handshake failed
    pub async fn connect(
        &mut self,
        connector: &C,
        endpoint: &Endpoint,
    ) -> Result<SessionReader<C::Stream>, SessionError> {
        self.state.transition(SessionState::Connecting, "connect")?;

        match connector.connect(endpoint).await {
            Ok((sink, stream)) => {
                *self.sink.lock().await = Some(sink);
                self.state.transition(SessionState::Open, "complete handshake")?;
                tracing::info!(attempt = self.attempt, %endpoint, "session open");
                Ok(SessionReader { stream, state: self.state.clone() })
            },
            Err(e) => {
                self.state.abort();
                tracing::warn!(attempt = self.attempt, %endpoint, error = %e, "connect failed");
                Err(e.into())
            },
        }
    }

    /// Handle for sending frames.
    pub fn writer(&self) -> SessionWriter<C::Sink> {
        SessionWriter { sink: Arc::clone(&self.sink), state: self.state.clone() }
    }

    /// Scoped close.
    ///
    /// Sends a close frame if the session is `Open` or `CloseReceived` and
    /// moves it to `Closed`. In any other state this is a no-op, so calling
    /// it repeatedly is safe. Returns whether a close frame was sent.
    ///
    /// # Errors
    ///
    /// `SessionError::Transport` if writing the close frame failed. The
    /// session is then `Aborted`.
    pub async fn close(&self, reason: &str) -> Result<bool, SessionError> {
        let mut guard = self.sink.lock().await;

        let state = self.state.get();
        if !state.accepts_close() {
            tracing::debug!(attempt = self.attempt, ?state, "close skipped");
            return Ok(false);
        }
        let Some(sink) = guard.as_mut() else {
            return Ok(false);
        };

        match sink.send(Frame::close(reason)).await {
            // Peer finished the close handshake first
            Ok(()) | Err(TransportError::Closed) => {
                self.state.transition(SessionState::Closed, "close")?;
                tracing::info!(attempt = self.attempt, reason, "session closed");
                Ok(true)
            },
            Err(e) => {
                self.state.abort();
                Err(e.into())
            },
        }
    }
}

/// Cloneable send handle over the shared write half.
#[derive(Debug)]
pub struct SessionWriter<S> {
    sink: Arc<Mutex<Option<S>>>,
    state: StateHandle,
}

impl<S> Clone for SessionWriter<S> {
    fn clone(&self) -> Self {
        Self { sink: Arc::clone(&self.sink), state: self.state.clone() }
    }
}

impl<S: FrameSink> SessionWriter<S> {
    /// Send one complete text frame.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotOpen` unless the session is `Open`
    /// - `SessionError::Transport` if the write failed. The session is then
    ///   `Aborted`.
    pub async fn send_text(&self, text: String) -> Result<(), SessionError> {
        let mut guard = self.sink.lock().await;

        let state = self.state.get();
        if state != SessionState::Open {
            return Err(SessionError::NotOpen(state));
        }
        let sink = guard.as_mut().ok_or(SessionError::NotOpen(state))?;

        if let Err(e) = sink.send(Frame::Text(text)).await {
            self.state.abort();
            return Err(e.into());
        }
        Ok(())
    }
}

/// What one receive produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Text payload (binary frames are decoded lossily).
    Text(String),
    /// Peer sent a close frame.
    Closed {
        /// Close status code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// Connection failed or ended without a close frame.
    Lost(String),
}

/// Read half of a session, owned by the inbound pump.
#[derive(Debug)]
pub struct SessionReader<R> {
    stream: R,
    state: StateHandle,
}

impl<R: FrameStream> SessionReader<R> {
    /// Receive the next frame and apply its state transition.
    pub async fn recv(&mut self) -> Received {
        match self.stream.recv().await {
            Some(Ok(Frame::Text(text))) => Received::Text(text),
            Some(Ok(Frame::Binary(data))) => {
                Received::Text(String::from_utf8_lossy(&data).into_owned())
            },
            Some(Ok(Frame::Close { code, reason })) => {
                self.state.peer_closed();
                Received::Closed { code, reason }
            },
            Some(Err(e)) => {
                self.state.abort();
                Received::Lost(e.to_string())
            },
            None => {
                self.state.abort();
                Received::Lost("connection ended without close frame".to_string())
            },
        }
    }
}
