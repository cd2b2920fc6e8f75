//! Interpretation of typed lines.

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Nothing to send.
    Skip,
    /// Leave the chat and stop reconnecting.
    Exit,
    /// Show the main menu.
    ShowMenu,
    /// Send the line as a chat message.
    Send(String),
}

/// Parse one typed line.
///
/// `exit` matches case-insensitively, ignoring surrounding whitespace.
/// `showmenu` also ignores whitespace inside (`show menu`). Everything else
/// is sent verbatim.
pub fn parse_line(line: &str) -> LineCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return LineCommand::Skip;
    }
    if line.trim().eq_ignore_ascii_case("exit") {
        return LineCommand::Exit;
    }

    let squashed: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if squashed.eq_ignore_ascii_case("showmenu") {
        return LineCommand::ShowMenu;
    }

    LineCommand::Send(line.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_skipped() {
        assert_eq!(parse_line(""), LineCommand::Skip);
        assert_eq!(parse_line("\r\n"), LineCommand::Skip);
    }

    #[test]
    fn exit_any_case() {
        assert_eq!(parse_line("exit"), LineCommand::Exit);
        assert_eq!(parse_line("EXIT"), LineCommand::Exit);
        assert_eq!(parse_line("  Exit "), LineCommand::Exit);
        assert_eq!(parse_line("exit now"), LineCommand::Send("exit now".into()));
    }

    #[test]
    fn showmenu_ignores_whitespace() {
        assert_eq!(parse_line("showmenu"), LineCommand::ShowMenu);
        assert_eq!(parse_line("Show Menu"), LineCommand::ShowMenu);
        assert_eq!(parse_line(" s h o w m e n u\t"), LineCommand::ShowMenu);
    }

    #[test]
    fn other_lines_sent_verbatim() {
        assert_eq!(parse_line("hello"), LineCommand::Send("hello".into()));
        assert_eq!(parse_line("  spaced  "), LineCommand::Send("  spaced  ".into()));
    }
}
