//! Console presenter.
//!
//! Colors: cyan menu and connect progress, yellow for our own echoed
//! messages, magenta for system notices, dark green for broadcasts, red for
//! errors, green for the connected notice. Borders and centering follow the
//! terminal width.

use std::{
    io::{self, Write, stdout},
    sync::Arc,
};

use crossterm::{
    QueueableCommand,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use parley_client::{LineSource, MenuChoice, Presenter, Status, parse_reconnect_answer};
use parley_proto::ChatMessage;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};

/// Title shown in the main menu.
pub const WELCOME: &str = "Welcome to Parley";

/// Width used when the terminal size is unavailable (piped output).
const FALLBACK_WIDTH: usize = 80;

/// Stdin line reader shared by prompts and chat input.
#[derive(Debug, Clone)]
pub struct SharedInput(Arc<Mutex<Lines<BufReader<Stdin>>>>);

impl SharedInput {
    /// Wrap process stdin.
    pub fn stdin() -> Self {
        Self(Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())))
    }

    /// Next line, without its terminator. `None` on EOF or read error.
    async fn read_line(&self) -> Option<String> {
        match self.0.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                None
            },
        }
    }
}

/// Renders to stdout and prompts on stdin.
#[derive(Debug, Clone)]
pub struct ConsolePresenter {
    input: SharedInput,
}

impl ConsolePresenter {
    /// Create a presenter reading answers from `input`.
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }

    fn write(&self, color: Option<Color>, text: &str, newline: bool) {
        if let Err(e) = write_colored(&mut stdout().lock(), color, text, newline) {
            tracing::debug!(error = %e, "console write failed");
        }
    }

    async fn prompt(&self, text: &str) -> Option<String> {
        self.write(Some(Color::White), text, false);
        self.input.read_line().await
    }
}

fn write_colored(
    out: &mut impl Write,
    color: Option<Color>,
    text: &str,
    newline: bool,
) -> io::Result<()> {
    if let Some(color) = color {
        out.queue(SetForegroundColor(color))?;
    }
    out.queue(Print(text))?;
    if color.is_some() {
        out.queue(ResetColor)?;
    }
    if newline {
        out.queue(Print("\n"))?;
    }
    out.flush()
}

impl Presenter for ConsolePresenter {
    async fn show_menu(&self) -> MenuChoice {
        let width = terminal_width();
        self.write(Some(Color::Cyan), &menu_text(width), false);

        loop {
            let Some(line) = self.prompt("Press Enter option Number: ").await else {
                return MenuChoice::Exit;
            };
            match parse_menu_choice(&line) {
                Some(choice) => return choice,
                None => self.report_error("Invalid choice."),
            }
        }
    }

    async fn prompt_username(&self) -> Option<String> {
        self.prompt("Input UserName: ").await
    }

    async fn prompt_reconnect(&self) -> bool {
        let answer = self.prompt("Would you like to reconnect? (y/n): ").await;
        parse_reconnect_answer(answer.as_deref())
    }

    fn report_error(&self, text: &str) {
        self.write(Some(Color::Red), text, true);
    }

    fn report_status(&self, status: Status) {
        let (color, text, newline) = status_line(status);
        self.write(Some(color), text, newline);
    }

    fn render_message(&self, message: &ChatMessage) {
        match message {
            ChatMessage::SelfEcho { text } => self.write(Some(Color::Yellow), text, true),
            ChatMessage::SystemNotice { text } => self.write(Some(Color::Magenta), text, true),
            ChatMessage::PlainBroadcast { text } => self.write(Some(Color::DarkGreen), text, true),
            ChatMessage::UserListReply { names } => self.render_user_list(names),
        }
    }

    fn render_user_list(&self, names: &[String]) {
        let text = user_list_text(names, terminal_width());
        self.write(Some(Color::Cyan), &text, false);
    }
}

/// Typed chat lines from the shared stdin reader.
#[derive(Debug, Clone)]
pub struct ConsoleLines {
    input: SharedInput,
}

impl ConsoleLines {
    /// Create a line source over `input`.
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }
}

impl LineSource for ConsoleLines {
    async fn next_line(&self) -> Option<String> {
        self.input.read_line().await
    }
}

/// Color, text and trailing newline for a status notice.
fn status_line(status: Status) -> (Color, &'static str, bool) {
    match status {
        Status::Connecting => (Color::Cyan, "Connecting to Server.", false),
        Status::ConnectProgress => (Color::Cyan, ".", false),
        Status::ClosingProgress => (Color::White, ".", false),
        Status::Connected => (Color::Green, "\nConnected!", true),
        Status::AlreadyConnected => (Color::Cyan, "Already connected.", true),
        Status::ConnectionLost => (Color::Red, "\nConnection lost.", true),
        // Only reported after a termination request
        Status::Exiting => (Color::White, "Exiting due to Ctrl+C...", true),
        Status::Closing => (Color::White, "\nClosing Application.", false),
    }
}

fn terminal_width() -> usize {
    terminal::size().map_or(FALLBACK_WIDTH, |(cols, _)| usize::from(cols).max(1))
}

/// Map a typed menu entry to a choice.
pub fn parse_menu_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Connect),
        "2" => Some(MenuChoice::ViewUsers),
        "3" => Some(MenuChoice::Exit),
        _ => None,
    }
}

/// Full-width `=` border.
pub fn border(width: usize) -> String {
    "=".repeat(width)
}

/// Left-pad `text` so it sits in the middle of `width` columns.
pub fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(pad))
}

/// Main menu block, one line per row, newline-terminated.
pub fn menu_text(width: usize) -> String {
    let rows = [
        border(width),
        center(WELCOME, width),
        border(width),
        "Select Option:".to_string(),
        "1. Connect to Chat Server".to_string(),
        "2. View Connected Users".to_string(),
        "3. Exit".to_string(),
        border(width),
    ];
    rows.iter().map(|row| format!("{row}\n")).collect()
}

/// Bordered, centered user list, newline-terminated.
pub fn user_list_text(names: &[String], width: usize) -> String {
    let mut rows = vec![border(width), center("Connected User List:", width)];
    rows.extend(names.iter().map(|name| center(name.trim(), width)));
    rows.push(border(width));
    rows.iter().map(|row| format!("{row}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_choices() {
        assert_eq!(parse_menu_choice("1"), Some(MenuChoice::Connect));
        assert_eq!(parse_menu_choice(" 2 "), Some(MenuChoice::ViewUsers));
        assert_eq!(parse_menu_choice("3"), Some(MenuChoice::Exit));
        assert_eq!(parse_menu_choice("4"), None);
        assert_eq!(parse_menu_choice(""), None);
    }

    #[test]
    fn centering() {
        assert_eq!(center("ab", 6), "  ab");
        assert_eq!(center("too long", 4), "too long");
    }

    #[test]
    fn user_list_is_bordered_and_centered() {
        let text = user_list_text(&["alice".into(), " bob ".into()], 10);
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows, vec![
            "==========",
            "Connected User List:",
            "  alice",
            "   bob",
            "==========",
        ]);
    }

    #[test]
    fn menu_lists_three_options() {
        let text = menu_text(20);
        assert!(text.contains("1. Connect to Chat Server\n"));
        assert!(text.contains("2. View Connected Users\n"));
        assert!(text.contains("3. Exit\n"));
        assert!(text.starts_with(&border(20)));
    }

    #[test]
    fn status_lines() {
        let connecting = status_line(Status::Connecting);
        assert_eq!(connecting, (Color::Cyan, "Connecting to Server.", false));
        assert_eq!(status_line(Status::ConnectProgress).0, Color::Cyan);

        let exiting = status_line(Status::Exiting);
        assert_eq!(exiting, (Color::White, "Exiting due to Ctrl+C...", true));
    }

    #[test]
    fn colored_write_ends_with_newline() {
        let mut out = Vec::new();
        write_colored(&mut out, None, "plain", true).unwrap();
        assert_eq!(out, b"plain\n");
    }
}
