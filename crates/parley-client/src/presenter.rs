//! Presentation collaborator.
//!
//! The core never writes to the console. Everything the user sees or answers
//! goes through a [`Presenter`], and typed chat lines come from a
//! [`LineSource`]. The console implementation lives in the binary; tests use
//! the scripted implementation from `parley-harness`.

use std::future::Future;

use parley_proto::ChatMessage;

/// Main menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Connect to the chat server.
    Connect,
    /// Ask the server for the connected-user list.
    ViewUsers,
    /// Leave the application.
    Exit,
}

/// Progress and lifecycle notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Connect attempt started.
    Connecting,
    /// Connect still pending; emitted once per tick.
    ConnectProgress,
    /// Handshake complete.
    Connected,
    /// Menu asked to connect while already connected.
    AlreadyConnected,
    /// Live session aborted.
    ConnectionLost,
    /// Outbound pump noticed termination.
    Exiting,
    /// Graceful close started.
    Closing,
    /// Graceful close still waiting for the peer; emitted once per tick.
    ClosingProgress,
}

/// User-facing side of the client.
pub trait Presenter: Send + Sync + 'static {
    /// Show the main menu and wait for a valid choice.
    fn show_menu(&self) -> impl Future<Output = MenuChoice> + Send;

    /// Ask for a username. `None` if input is closed.
    fn prompt_username(&self) -> impl Future<Output = Option<String>> + Send;

    /// Ask whether to reconnect. `true` only for a `y` answer.
    fn prompt_reconnect(&self) -> impl Future<Output = bool> + Send;

    /// Show an error line.
    fn report_error(&self, text: &str);

    /// Show a progress or lifecycle notice.
    fn report_status(&self, status: Status);

    /// Show one classified inbound message.
    fn render_message(&self, message: &ChatMessage);

    /// Show the connected-user list.
    fn render_user_list(&self, names: &[String]);
}

/// Source of typed chat lines.
pub trait LineSource: Send + Sync + 'static {
    /// Wait for the next line, without its terminator. `None` once input is
    /// closed.
    fn next_line(&self) -> impl Future<Output = Option<String>> + Send;
}

/// Interpret a reconnect prompt answer.
pub fn parse_reconnect_answer(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_y_reconnects() {
        assert!(parse_reconnect_answer(Some("y")));
        assert!(parse_reconnect_answer(Some(" Y \n")));
        assert!(!parse_reconnect_answer(Some("yes")));
        assert!(!parse_reconnect_answer(Some("n")));
        assert!(!parse_reconnect_answer(None));
    }
}
