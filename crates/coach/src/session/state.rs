use chess_core::{GameHeaders, Replay};

use crate::clients::lichess::GameSummary;
use crate::coaching::{ChatMessage, FullAnalysis};
use crate::error::SessionError;

/// Which input widget is shown. Purely presentational; every action stays
/// available in every mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Manual,
    Pgn,
    Lichess,
}

/// In-flight requests. A request of a kind that is already running is
/// rejected by the reducer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loading {
    pub searching: bool,
    pub fetching_game: bool,
    pub analyzing: bool,
    pub thinking: bool,
}

impl Loading {
    pub fn any(&self) -> bool {
        self.searching || self.fetching_game || self.analyzing || self.thinking
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A move made after navigating back dropped the rest of the game.
    ContinuationDiscarded { from_ply: usize, moves: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub mode: InputMode,
    /// Raw PGN text as submitted or fetched; cleared once moves are played
    /// on the board.
    pub pgn: String,
    pub headers: GameHeaders,
    pub username: String,
    pub replay: Replay,
    pub analysis: Option<FullAnalysis>,
    pub games: Vec<GameSummary>,
    pub chat: Vec<ChatMessage>,
    pub loading: Loading,
    pub error: Option<SessionError>,
    pub notice: Option<Notice>,
}

impl SessionState {
    /// Game text to send for analysis: the PGN as given, or movetext built
    /// from the moves on the board.
    pub fn game_text(&self) -> Option<String> {
        if !self.pgn.trim().is_empty() {
            Some(self.pgn.clone())
        } else if !self.replay.is_empty() {
            Some(self.replay.to_movetext())
        } else {
            None
        }
    }
}
