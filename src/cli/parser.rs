//! Command line parser.

use std::str::FromStr;

use super::parse_move;
use crate::rules::MoveRequest;
use crate::session::{PieceStyle, TimerMode};
use crate::types::{piece_from_code, Piece, Square};

/// Parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// "start" - begin the game
    Start,
    /// "select e2" - click a square
    Select(Square),
    /// "move e2e4" / "move e7e8q" - select origin then destination
    Move(MoveRequest),
    /// "promote q" - finish a pending promotion
    Promote(Piece),
    /// "reset" - back to a fresh game
    Reset,
    /// "timer none|5min"
    Timer(TimerMode),
    /// "style default|alpha|neo"
    Style(PieceStyle),
    /// "wait [seconds]" - let time pass (default: until the computer replies)
    Wait(Option<f64>),
    /// "board" / "d"
    Board,
    Status,
    History,
    Captures,
    Stats,
    Clock,
    Eval,
    Help,
    Quit,
    /// A known command with a bad argument
    Invalid(String),
    Unknown(String),
}

/// Parse one input line
pub fn parse_command(input: &str) -> CliCommand {
    let input = input.trim();
    let mut parts = input.split_whitespace();

    match parts.next() {
        Some("start") => CliCommand::Start,
        Some("select") | Some("s") => parse_square(parts.next()),
        Some("move") | Some("m") => match parts.next().and_then(parse_move) {
            Some(request) => CliCommand::Move(request),
            None => CliCommand::Invalid("usage: move <from><to>[q|r|b|n]".to_string()),
        },
        Some("promote") | Some("p") => parse_promotion(parts.next()),
        Some("reset") | Some("new") => CliCommand::Reset,
        Some("timer") => parse_arg(parts.next(), CliCommand::Timer, "usage: timer none|5min"),
        Some("style") => parse_arg(parts.next(), CliCommand::Style, "usage: style default|alpha|neo"),
        Some("wait") | Some("w") => match parts.next() {
            None => CliCommand::Wait(None),
            Some(secs) => match secs.parse::<f64>() {
                Ok(s) if s >= 0.0 && s.is_finite() => CliCommand::Wait(Some(s)),
                _ => CliCommand::Invalid("usage: wait [seconds]".to_string()),
            },
        },
        Some("board") | Some("d") => CliCommand::Board,
        Some("status") => CliCommand::Status,
        Some("history") => CliCommand::History,
        Some("captures") => CliCommand::Captures,
        Some("stats") => CliCommand::Stats,
        Some("clock") => CliCommand::Clock,
        Some("eval") => CliCommand::Eval,
        Some("help") | Some("?") => CliCommand::Help,
        Some("quit") | Some("exit") => CliCommand::Quit,
        _ => CliCommand::Unknown(input.to_string()),
    }
}

fn parse_square(token: Option<&str>) -> CliCommand {
    match token.and_then(|t| Square::from_str(&t.to_ascii_lowercase()).ok()) {
        Some(square) => CliCommand::Select(square),
        None => CliCommand::Invalid("usage: select <square>".to_string()),
    }
}

fn parse_promotion(token: Option<&str>) -> CliCommand {
    let piece = token
        .and_then(|t| t.chars().next())
        .and_then(piece_from_code);
    match piece {
        Some(piece) => CliCommand::Promote(piece),
        None => CliCommand::Invalid("usage: promote q|r|b|n".to_string()),
    }
}

fn parse_arg<T: FromStr>(
    token: Option<&str>,
    make: impl FnOnce(T) -> CliCommand,
    usage: &str,
) -> CliCommand {
    match token.and_then(|t| t.parse::<T>().ok()) {
        Some(value) => make(value),
        None => CliCommand::Invalid(usage.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("start"), CliCommand::Start);
        assert_eq!(parse_command("  board "), CliCommand::Board);
        assert_eq!(parse_command("d"), CliCommand::Board);
        assert_eq!(parse_command("quit"), CliCommand::Quit);
        assert_eq!(parse_command("bogus"), CliCommand::Unknown("bogus".to_string()));
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(parse_command("select E2"), CliCommand::Select(Square::E2));
        assert!(matches!(parse_command("select"), CliCommand::Invalid(_)));
        assert!(matches!(parse_command("select j9"), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_move_and_promotion() {
        assert_eq!(
            parse_command("move e2e4"),
            CliCommand::Move(MoveRequest::new(Square::E2, Square::E4))
        );
        assert_eq!(
            parse_command("move e7e8n"),
            CliCommand::Move(MoveRequest::new(Square::E7, Square::E8).with_promotion(Piece::Knight))
        );
        assert!(matches!(parse_command("move e2"), CliCommand::Invalid(_)));
        assert_eq!(parse_command("promote Q"), CliCommand::Promote(Piece::Queen));
        assert!(matches!(parse_command("promote x"), CliCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_settings_and_wait() {
        assert_eq!(parse_command("timer 5min"), CliCommand::Timer(TimerMode::FiveMinutes));
        assert_eq!(parse_command("style neo"), CliCommand::Style(PieceStyle::Neo));
        assert!(matches!(parse_command("timer forever"), CliCommand::Invalid(_)));
        assert_eq!(parse_command("wait"), CliCommand::Wait(None));
        assert_eq!(parse_command("wait 2.5"), CliCommand::Wait(Some(2.5)));
        assert!(matches!(parse_command("wait -1"), CliCommand::Invalid(_)));
    }
}
