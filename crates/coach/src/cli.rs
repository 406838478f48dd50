//! Interactive command parsing for the terminal front-end.

use std::path::PathBuf;

use chess_core::shakmaty::{Role, Square};
use thiserror::Error;

use crate::session::{Event, GameSelector, InputMode, NavTarget};

pub const HELP: &str = "\
Input
  mode <manual|pgn|lichess>   switch the input panel
  pgn <movetext>              load a game from PGN text
  pgn                         paste a multi-line PGN, end with an empty line
  load <file>                 load a game from a PGN file
  search <username>           list a Lichess user's recent games
  games                       show the listed games
  select <n|game id>          load a listed game (or any Lichess game id)
  move <from><to>[piece]      play a move on the board, e.g. e2e4 or e7e8n
Replay
  start | back | next | end   move through the game
  goto <ply>                  jump to a half-move (0 is the initial position)
Coach
  analyze                     ask for a phase-by-phase evaluation
  chat <question>             ask the coach about the position
Display
  board | moves | report | chat
  reset                       start over
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Session(Event),
    LoadFile(PathBuf),
    PastePgn,
    ShowBoard,
    ShowMoves,
    ShowReport,
    ShowGames,
    ShowChat,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for the list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "mode" => Command::Session(Event::SetMode(parse_mode(rest)?)),
        "pgn" if rest.is_empty() => Command::PastePgn,
        "pgn" => Command::Session(Event::SubmitPgn(rest.to_string())),
        "load" if rest.is_empty() => return Err(CommandError::Usage("load <file>")),
        "load" => Command::LoadFile(PathBuf::from(rest)),
        "search" if rest.is_empty() => return Err(CommandError::Usage("search <username>")),
        "search" => Command::Session(Event::SearchUser(rest.to_string())),
        "games" => Command::ShowGames,
        "select" if rest.is_empty() => return Err(CommandError::Usage("select <n|game id>")),
        "select" => Command::Session(Event::SelectGame(parse_selector(rest))),
        "move" | "mv" => parse_move(rest)?,
        "start" => Command::Session(Event::Navigate(NavTarget::Start)),
        "back" | "prev" => Command::Session(Event::Navigate(NavTarget::Back)),
        "next" | "fwd" => Command::Session(Event::Navigate(NavTarget::Forward)),
        "end" => Command::Session(Event::Navigate(NavTarget::End)),
        "goto" => {
            let ply = rest.parse().map_err(|_| CommandError::Usage("goto <ply>"))?;
            Command::Session(Event::Navigate(NavTarget::Ply(ply)))
        }
        "analyze" | "analyse" => Command::Session(Event::RequestAnalysis),
        "chat" if rest.is_empty() => Command::ShowChat,
        "chat" | "ask" => Command::Session(Event::SendChat(rest.to_string())),
        "board" => Command::ShowBoard,
        "moves" => Command::ShowMoves,
        "report" => Command::ShowReport,
        "reset" => Command::Session(Event::Reset),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Collects a multi-line PGN typed or pasted after a bare `pgn` command.
///
/// Tag lines and the blank line after them are kept. The game is complete
/// once the movetext ends with a result token or a blank line follows it.
#[derive(Debug, Default)]
pub struct PgnPaste {
    text: String,
    in_movetext: bool,
}

impl PgnPaste {
    /// Add one line; returns `true` when the game is complete.
    pub fn push_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !self.text.is_empty() {
                self.text.push('\n');
            }
            return self.in_movetext;
        }

        self.text.push_str(trimmed);
        self.text.push('\n');
        if !trimmed.starts_with('[') {
            self.in_movetext = true;
        }
        self.in_movetext
            && trimmed
                .split_whitespace()
                .last()
                .is_some_and(|token| matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*"))
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

fn parse_mode(arg: &str) -> Result<InputMode, CommandError> {
    match arg.to_ascii_lowercase().as_str() {
        "manual" => Ok(InputMode::Manual),
        "pgn" => Ok(InputMode::Pgn),
        "lichess" => Ok(InputMode::Lichess),
        _ => Err(CommandError::Usage("mode <manual|pgn|lichess>")),
    }
}

/// Numbers are positions in the listed games (1-based as displayed);
/// anything else is taken as a Lichess game id.
fn parse_selector(arg: &str) -> GameSelector {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => GameSelector::Index(n - 1),
        _ => GameSelector::Id(arg.to_string()),
    }
}

fn parse_move(arg: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "move <from><to>[q|r|b|n], e.g. move e2e4";

    let compact: String = arg
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '=')
        .collect::<String>()
        .to_ascii_lowercase();
    if !(4..=5).contains(&compact.len()) || !compact.is_ascii() {
        return Err(CommandError::Usage(USAGE));
    }

    let from: Square = compact[0..2].parse().map_err(|_| CommandError::Usage(USAGE))?;
    let to: Square = compact[2..4].parse().map_err(|_| CommandError::Usage(USAGE))?;
    let promotion = match compact[4..].chars().next() {
        None => None,
        Some(c) => match Role::from_char(c) {
            Some(role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight)) => Some(role),
            _ => return Err(CommandError::Usage(USAGE)),
        },
    };

    Ok(Command::Session(Event::UserMove { from, to, promotion }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(line: &str) -> Event {
        match parse_command(line) {
            Ok(Some(Command::Session(event))) => event,
            other => panic!("expected a session event, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_moves() {
        assert_eq!(
            session("move e2e4"),
            Event::UserMove { from: "e2".parse().unwrap(), to: "e4".parse().unwrap(), promotion: None }
        );
        assert_eq!(
            session("move e7 e8=N"),
            Event::UserMove {
                from: "e7".parse().unwrap(),
                to: "e8".parse().unwrap(),
                promotion: Some(Role::Knight),
            }
        );
        assert!(matches!(parse_command("move e2"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_command("move e7e8k"), Err(CommandError::Usage(_))));
        assert!(matches!(parse_command("move z9e4"), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_pgn_and_chat_keep_their_text() {
        assert_eq!(session("pgn 1. e4 e5 2. Nf3"), Event::SubmitPgn("1. e4 e5 2. Nf3".into()));
        assert_eq!(parse_command("pgn"), Ok(Some(Command::PastePgn)));
        assert_eq!(session("chat Why is Nf3 good?"), Event::SendChat("Why is Nf3 good?".into()));
        assert_eq!(parse_command("chat"), Ok(Some(Command::ShowChat)));
    }

    #[test]
    fn test_selector_and_navigation() {
        assert_eq!(session("select 2"), Event::SelectGame(GameSelector::Index(1)));
        assert_eq!(session("select q7ZvsdUF"), Event::SelectGame(GameSelector::Id("q7ZvsdUF".into())));
        assert_eq!(session("goto 0"), Event::Navigate(NavTarget::Ply(0)));
        assert_eq!(session("PREV"), Event::Navigate(NavTarget::Back));
        assert!(matches!(parse_command("goto x"), Err(CommandError::Usage(_))));
    }

    fn paste(lines: &[&str]) -> (Option<usize>, String) {
        let mut buffer = PgnPaste::default();
        let done_at = lines.iter().position(|line| buffer.push_line(line));
        (done_at, buffer.into_text())
    }

    #[test]
    fn test_paste_keeps_moves_after_tag_block() {
        let (done_at, text) = paste(&["[Event \"x\"]", "[White \"A\"]", "", "1. e4 e5 2. Nf3 *", "moves"]);
        assert_eq!(done_at, Some(3));
        assert_eq!(text, "[Event \"x\"]\n[White \"A\"]\n\n1. e4 e5 2. Nf3 *\n");
    }

    #[test]
    fn test_paste_ends_on_blank_after_movetext() {
        let (done_at, text) = paste(&["", "[Result \"1-0\"]", "", "1. d4 d5", "2. c4", "", "board"]);
        assert_eq!(done_at, Some(5));
        assert!(text.ends_with("1. d4 d5\n2. c4\n\n"));

        let (done_at, _) = paste(&["[Event \"x\"]", ""]);
        assert_eq!(done_at, None);
    }

    #[test]
    fn test_mode_and_unknown() {
        assert_eq!(session("mode lichess"), Event::SetMode(InputMode::Lichess));
        assert!(matches!(parse_command("mode board"), Err(CommandError::Usage(_))));
        assert_eq!(parse_command("dance"), Err(CommandError::Unknown("dance".into())));
        assert_eq!(parse_command("load games/today.pgn"), Ok(Some(Command::LoadFile("games/today.pgn".into()))));
    }
}
