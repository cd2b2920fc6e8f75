//! Simulation harness for parley client testing.
//!
//! In-memory implementations of the client's seams so the real controller
//! and pumps run without sockets or a console:
//!
//! - [`MemoryConnector`]: a [`parley_client::Connector`] over channels, with
//!   a [`MemoryServer`] handle for the test to play the server
//! - [`ScriptedPresenter`]: answers prompts from a script and records
//!   everything shown to the user
//! - [`ScriptedLines`]: typed lines fed from the test through a [`LineFeeder`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod scripted;
pub mod sim_transport;

pub use scripted::{LineFeeder, PresenterEvent, ScriptedLines, ScriptedPresenter};
pub use sim_transport::{ConnectPlan, MemoryConnector, MemoryServer, ServerConn};
