//! Replay state: the linear move list of a game, a cursor into it, and the
//! position currently on the board.
//!
//! Legality, SAN and FEN all come from shakmaty; PGN movetext is tokenized by
//! pgn-reader. The cursor is `None` for the initial position and `Some(i)`
//! when moves `0..=i` have been played.

use std::ops::ControlFlow;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Color, EnPassantMode, Move, Position,
    Role, Square,
};
use thiserror::Error;

use crate::game_data::PlayedMove;
use crate::pgn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Invalid PGN: {0}")]
    InvalidPgn(String),
}

/// A user move accepted by [`Replay::apply_user_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    pub played: PlayedMove,
    /// Moves that followed the cursor and were dropped to make room.
    pub discarded: Vec<PlayedMove>,
}

#[derive(Debug, Clone)]
pub struct Replay {
    initial: Chess,
    line: Vec<Move>,
    moves: Vec<PlayedMove>,
    cursor: Option<usize>,
    position: Chess,
}

impl Default for Replay {
    fn default() -> Self {
        Self {
            initial: Chess::default(),
            line: Vec::new(),
            moves: Vec::new(),
            cursor: None,
            position: Chess::default(),
        }
    }
}

impl PartialEq for Replay {
    fn eq(&self, other: &Self) -> bool {
        self.moves == other.moves
            && self.cursor == other.cursor
            && self.fen() == other.fen()
            && fen_of(&self.initial) == fen_of(&other.initial)
    }
}

impl Replay {
    /// Replay a PGN string from its initial position. The cursor lands on the
    /// last move so the final position is shown.
    pub fn from_pgn(pgn: &str) -> Result<Self, ReplayError> {
        if pgn.trim().is_empty() {
            return Err(ReplayError::InvalidPgn("empty input".into()));
        }

        let mut collector = LineCollector;
        let mut reader = Reader::new(pgn.as_bytes());
        let game = reader
            .read_game(&mut collector)
            .map_err(|e| ReplayError::InvalidPgn(format!("read error: {e}")))?
            .ok_or_else(|| ReplayError::InvalidPgn("no game found".into()))??;

        let expected = pgn::count_move_tokens(pgn).unwrap_or(game.moves.len());
        if expected != game.moves.len() {
            return Err(ReplayError::InvalidPgn(format!(
                "unrecognised movetext after {} moves",
                game.moves.len()
            )));
        }

        let cursor = game.moves.len().checked_sub(1);

        Ok(Self {
            initial: game.initial,
            line: game.line,
            moves: game.moves,
            cursor,
            position: game.end,
        })
    }

    pub fn moves(&self) -> &[PlayedMove] {
        &self.moves
    }

    pub fn san_moves(&self) -> Vec<&str> {
        self.moves.iter().map(|m| m.san.as_str()).collect()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub fn fen(&self) -> String {
        fen_of(&self.position)
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The move that produced the displayed position, if any.
    pub fn current_move(&self) -> Option<&PlayedMove> {
        self.cursor.and_then(|i| self.moves.get(i))
    }

    /// Numbered movetext for the whole move list. A game that does not start
    /// from the standard position gets `SetUp`/`FEN` tags and is numbered
    /// from that position.
    pub fn to_movetext(&self) -> String {
        let initial_fen = fen_of(&self.initial);
        let movetext = pgn::format_movetext_from(
            &self.san_moves(),
            self.initial.fullmoves().get(),
            self.initial.turn() == Color::Black,
        );
        if initial_fen == fen_of(&Chess::default()) {
            movetext
        } else {
            format!("[SetUp \"1\"]\n[FEN \"{initial_fen}\"]\n\n{movetext}")
        }
    }

    /// Show the position after move `cursor` (or the initial position for
    /// `None`). Indices past the end are clamped to the last move.
    pub fn navigate_to(&mut self, cursor: Option<usize>) {
        let cursor = match (cursor, self.moves.len().checked_sub(1)) {
            (Some(i), Some(last)) => Some(i.min(last)),
            _ => None,
        };

        let upto = cursor.map_or(0, |i| i + 1);
        let mut pos = self.initial.clone();
        for mv in &self.line[..upto] {
            match pos.clone().play(mv.clone()) {
                Ok(next) => pos = next,
                Err(_) => break,
            }
        }

        self.cursor = cursor;
        self.position = pos;
    }

    pub fn go_to_start(&mut self) {
        self.navigate_to(None);
    }

    pub fn go_to_end(&mut self) {
        self.navigate_to(self.moves.len().checked_sub(1));
    }

    pub fn step_back(&mut self) {
        self.navigate_to(self.cursor.and_then(|i| i.checked_sub(1)));
    }

    pub fn step_forward(&mut self) {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next < self.moves.len() {
            self.navigate_to(Some(next));
        }
    }

    /// Try a move from the displayed position. Returns `None` (and changes
    /// nothing) when the move is illegal. A legal move drops every move after
    /// the cursor before it is appended.
    ///
    /// `promotion` only matters for a pawn reaching the last rank and
    /// defaults to a queen.
    pub fn apply_user_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Role>,
    ) -> Option<MoveApplied> {
        let plain = UciMove::Normal { from, to, promotion: None };
        let mv = plain.to_move(&self.position).ok().or_else(|| {
            let promoted = UciMove::Normal {
                from,
                to,
                promotion: Some(promotion.unwrap_or(Role::Queen)),
            };
            promoted.to_move(&self.position).ok()
        })?;

        let (next, played) = play_recorded(&self.position, &mv).ok()?;

        let keep = self.cursor.map_or(0, |i| i + 1);
        self.line.truncate(keep);
        let discarded = self.moves.split_off(keep);

        self.line.push(mv);
        self.moves.push(played.clone());
        self.cursor = Some(self.moves.len() - 1);
        self.position = next;

        Some(MoveApplied { played, discarded })
    }
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Play `mv` on a copy of `pos` and describe it the way the move list stores it.
fn play_recorded(pos: &Chess, mv: &Move) -> Result<(Chess, PlayedMove), ReplayError> {
    let mut san = San::from_move(pos, mv.clone()).to_string();
    let next = pos
        .clone()
        .play(mv.clone())
        .map_err(|_| ReplayError::InvalidPgn(format!("illegal move {san}")))?;

    if next.is_checkmate() {
        san.push('#');
    } else if next.is_check() {
        san.push('+');
    }

    let (from, to) = match mv.to_uci(CastlingMode::Standard) {
        UciMove::Normal { from, to, .. } => (from, to),
        _ => (mv.from().unwrap_or_else(|| mv.to()), mv.to()),
    };

    let played = PlayedMove {
        from,
        to,
        san,
        fen_after: fen_of(&next),
    };
    Ok((next, played))
}

/// Main line of one game, as replayed by [`LineCollector`].
struct GameLine {
    initial: Chess,
    end: Chess,
    line: Vec<Move>,
    moves: Vec<PlayedMove>,
}

#[derive(Default)]
struct SetupTags {
    fen: Option<String>,
}

/// Visitor that replays the main line, failing on the first illegal move.
/// Variations are skipped.
struct LineCollector;

impl Visitor for LineCollector {
    type Tags = SetupTags;
    type Movetext = GameLine;
    type Output = Result<GameLine, ReplayError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, SetupTags> {
        ControlFlow::Continue(SetupTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut SetupTags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        if name == b"FEN" {
            tags.fen = Some(value.decode_utf8_lossy().into_owned());
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: SetupTags) -> ControlFlow<Self::Output, GameLine> {
        let initial = match tags.fen {
            Some(fen) => {
                let parsed = fen
                    .parse::<Fen>()
                    .map_err(|e| ReplayError::InvalidPgn(format!("bad FEN tag: {e}")))
                    .and_then(|f| {
                        f.into_position::<Chess>(CastlingMode::Standard)
                            .map_err(|e| ReplayError::InvalidPgn(format!("bad FEN tag: {e}")))
                    });
                match parsed {
                    Ok(pos) => pos,
                    Err(e) => return ControlFlow::Break(Err(e)),
                }
            }
            None => Chess::default(),
        };

        ControlFlow::Continue(GameLine {
            end: initial.clone(),
            initial,
            line: Vec::new(),
            moves: Vec::new(),
        })
    }

    fn san(&mut self, game: &mut GameLine, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        let ply = game.moves.len() + 1;
        let mv = match san_plus.san.to_move(&game.end) {
            Ok(mv) => mv,
            Err(_) => {
                return ControlFlow::Break(Err(ReplayError::InvalidPgn(format!(
                    "illegal move {} at ply {ply}",
                    san_plus.san
                ))))
            }
        };

        match play_recorded(&game.end, &mv) {
            Ok((next, played)) => {
                game.end = next;
                game.line.push(mv);
                game.moves.push(played);
                ControlFlow::Continue(())
            }
            Err(e) => ControlFlow::Break(Err(e)),
        }
    }

    fn begin_variation(&mut self, _game: &mut GameLine) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, game: GameLine) -> Self::Output {
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_load_short_game() {
        let replay = Replay::from_pgn("1. e4 e5 2. Nf3").unwrap();
        assert_eq!(replay.san_moves(), vec!["e4", "e5", "Nf3"]);
        assert_eq!(replay.cursor(), Some(2));
        assert_eq!(
            replay.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
        assert_eq!(replay.moves()[2].from, sq("g1"));
        assert_eq!(replay.moves()[2].to, sq("f3"));
    }

    #[test]
    fn test_end_position_matches_direct_replay() {
        let pgn = r#"[Event "Casual"]
[White "A"]
[Black "B"]
[Result "1-0"]

1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6?? 4. Qxf7# 1-0"#;
        let mut replay = Replay::from_pgn(pgn).unwrap();
        let end_fen = replay.fen();

        let mut pos = Chess::default();
        for san in ["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"] {
            let mv = san.parse::<San>().unwrap().to_move(&pos).unwrap();
            pos = pos.play(mv).unwrap();
        }
        assert_eq!(end_fen, fen_of(&pos));

        replay.go_to_start();
        replay.navigate_to(Some(replay.moves().len() - 1));
        assert_eq!(replay.fen(), end_fen);
        assert_eq!(replay.current_move().unwrap().san, "Qxf7#");
    }

    #[test]
    fn test_navigate_is_idempotent() {
        let mut replay = Replay::from_pgn("1. d4 d5 2. c4 e6 3. Nc3 Nf6").unwrap();
        for i in 0..replay.moves().len() {
            replay.navigate_to(Some(i));
            let first = replay.fen();
            replay.navigate_to(Some(i));
            assert_eq!(replay.fen(), first);
            assert_eq!(replay.fen(), replay.moves()[i].fen_after);
        }
    }

    #[test]
    fn test_navigate_clamps_and_steps() {
        let mut replay = Replay::from_pgn("1. e4 e5").unwrap();
        replay.navigate_to(Some(99));
        assert_eq!(replay.cursor(), Some(1));

        replay.step_back();
        replay.step_back();
        assert_eq!(replay.cursor(), None);
        assert_eq!(replay.fen(), fen_of(&Chess::default()));

        replay.step_back();
        assert_eq!(replay.cursor(), None);

        replay.step_forward();
        replay.step_forward();
        replay.step_forward();
        assert_eq!(replay.cursor(), Some(1));
    }

    #[test]
    fn test_invalid_pgn_is_rejected() {
        assert!(matches!(
            Replay::from_pgn("1. e4 e5 2. Ke3"),
            Err(ReplayError::InvalidPgn(_))
        ));
        assert!(Replay::from_pgn("").is_err());
        assert!(Replay::from_pgn("   \n").is_err());
        assert!(Replay::from_pgn("not a chess game at all").is_err());
    }

    #[test]
    fn test_comments_and_variations_are_skipped() {
        let pgn = "1. e4 {king pawn} e5 (1... c5 2. Nf3) 2. Nf3 $1 *";
        let replay = Replay::from_pgn(pgn).unwrap();
        assert_eq!(replay.san_moves(), vec!["e4", "e5", "Nf3"]);
    }

    #[test]
    fn test_nested_variations_and_bracketed_tags() {
        let pgn = "[Event \"Titled Arena [Blitz]\"]\n[White \"A\"]\n\n\
                   1. e4 e5 (1... c5 2. Nf3 (2. c3 d5) d6) 2. Nf3 (2. Bc4) Nc6 *";
        let replay = Replay::from_pgn(pgn).unwrap();
        assert_eq!(replay.san_moves(), vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_movetext_from_fen_start_replays() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let pgn = format!("[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n1... e5 2. Nf3 *");
        let mut replay = Replay::from_pgn(&pgn).unwrap();
        replay.apply_user_move(sq("b8"), sq("c6"), None).unwrap();

        let text = replay.to_movetext();
        assert_eq!(
            text,
            format!("[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n1... e5 2. Nf3 Nc6")
        );
        let again = Replay::from_pgn(&text).unwrap();
        assert_eq!(again.san_moves(), vec!["e5", "Nf3", "Nc6"]);
        assert_eq!(again.fen(), replay.fen());
    }

    #[test]
    fn test_illegal_user_move_changes_nothing() {
        let mut replay = Replay::from_pgn("1. e4 e5").unwrap();
        let before = replay.clone();
        assert!(replay.apply_user_move(sq("e1"), sq("e3"), None).is_none());
        assert!(replay.apply_user_move(sq("d2"), sq("d5"), None).is_none());
        assert_eq!(replay, before);
    }

    #[test]
    fn test_user_move_discards_continuation() {
        let mut replay = Replay::from_pgn("1. e4 e5 2. Nf3").unwrap();
        replay.navigate_to(Some(0));

        let applied = replay.apply_user_move(sq("d7"), sq("d5"), None).unwrap();
        assert_eq!(applied.played.san, "d5");
        let dropped: Vec<_> = applied.discarded.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(dropped, vec!["e5", "Nf3"]);

        assert_eq!(replay.san_moves(), vec!["e4", "d5"]);
        assert_eq!(replay.cursor(), Some(1));
        assert_eq!(replay.to_movetext(), "1. e4 d5");
    }

    #[test]
    fn test_user_move_from_start_of_empty_board() {
        let mut replay = Replay::default();
        let applied = replay.apply_user_move(sq("e2"), sq("e4"), Some(Role::Knight)).unwrap();
        assert_eq!(applied.played.san, "e4");
        assert!(applied.discarded.is_empty());
        assert_eq!(replay.cursor(), Some(0));
    }

    #[test]
    fn test_castling_and_promotion() {
        let mut replay = Replay::from_pgn("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5").unwrap();
        let castle = replay.apply_user_move(sq("e1"), sq("g1"), None).unwrap();
        assert_eq!(castle.played.san, "O-O");
        assert_eq!(castle.played.to, sq("g1"));

        let pgn = "[SetUp \"1\"]\n[FEN \"8/P7/8/8/8/8/8/k6K w - - 0 1\"]\n\n*";
        let mut replay = Replay::from_pgn(pgn).unwrap();
        assert_eq!(replay.cursor(), None);
        assert!(replay.is_empty());

        let queen = replay.apply_user_move(sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(queen.played.san, "a8=Q+");

        replay.go_to_start();
        let knight = replay.apply_user_move(sq("a7"), sq("a8"), Some(Role::Knight)).unwrap();
        assert_eq!(knight.played.san, "a8=N");
        assert_eq!(knight.discarded.len(), 1);
    }
}
