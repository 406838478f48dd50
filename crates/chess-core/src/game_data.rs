use shakmaty::Square;

/// Seven-tag-roster style header fields shown above the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameHeaders {
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2", "*"
    pub event: Option<String>,
}

/// One half-move of the game as produced by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub from: Square,
    pub to: Square,
    pub san: String, // SAN with check/mate suffix
    pub fen_after: String,
}
