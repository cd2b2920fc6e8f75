//! Client
//!
//! Connection lifecycle and duplex message exchange for the parley chat
//! client. One persistent connection carries two independent activities:
//! reading inbound broadcasts and server replies, and sending what the user
//! types.
//!
//! # Architecture
//!
//! The [`ConnectionController`] builds a fresh [`Session`] per attempt, opens
//! it through a [`Connector`], and races the inbound and outbound pumps over
//! it. Whichever pump ends first ends the exchange. The controller then
//! closes the session and decides whether to reconnect.
//!
//! Everything the user sees goes through a [`Presenter`]. Typed lines come
//! from a [`LineSource`]. The core never touches the console, so the same
//! code runs against the terminal and against scripted test doubles.
//!
//! # Components
//!
//! - [`ChatClient`]: Main menu and username prompt
//! - [`ConnectionController`]: Connect, race, close, reconnect
//! - [`Session`]: Per-attempt state machine over one connection
//! - [`SessionContext`]: Identity plus process lifecycle
//! - [`pump`]: Inbound and outbound pumps
//!
//! # Transport (optional)
//!
//! With the `websocket` feature enabled, this crate also provides
//! [`websocket::WebSocketConnector`] over `tokio-tungstenite`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod command;
mod config;
mod context;
mod controller;
mod error;
mod presenter;
pub mod pump;
mod session;
pub mod transport;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use client::ChatClient;
pub use command::{LineCommand, parse_line};
pub use config::{
    ClientConfig, DEFAULT_CLOSE_GRACE, DEFAULT_CONNECT_TICK, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_RECEIVE_BUFFER_SIZE, DEFAULT_SERVER_URL, Endpoint, FailurePolicy,
};
pub use context::{Identity, Lifecycle, ReconnectIntent, SessionContext};
pub use controller::{CLOSE_REASON, ConnectionController, LoopOutcome};
pub use error::{ClientError, SessionError, TransportError};
pub use parley_proto::{ChatMessage, Codec, OutboundMessage, WireFormat};
pub use presenter::{LineSource, MenuChoice, Presenter, Status, parse_reconnect_answer};
pub use session::{Received, Session, SessionReader, SessionState, SessionWriter};
pub use transport::{Connector, Frame, FrameSink, FrameStream};
