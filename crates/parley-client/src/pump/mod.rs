//! Duplex pumps.
//!
//! Two independent tasks share one open session:
//!
//! - [`receive_loop`]: reads frames, classifies them and hands them to the
//!   presenter, one at a time in receipt order.
//! - [`send_loop`]: reads typed lines, runs local commands and sends
//!   everything else.
//!
//! Neither pump returns an error. Each ends with a [`PumpExit`], and the
//! first one to end closes the duplex exchange. Both select on a
//! cancellation token at every suspension point so the loser stops promptly.

mod inbound;
mod outbound;

pub use inbound::receive_loop;
pub use outbound::send_loop;

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// Peer closed the connection.
    CloseReceived,
    /// Connection failed.
    Aborted,
    /// User typed `exit` or chose Exit from the menu.
    ExitRequested,
    /// Cancelled by the controller or a termination request.
    Cancelled,
}
