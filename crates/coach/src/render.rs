//! Plain-text rendering of the session for the terminal.

use chess_core::shakmaty::{Color, File, Position, Rank, Square};
use chess_core::Replay;

use crate::clients::lichess::GameSummary;
use crate::coaching::{ChatMessage, ChatRole, FullAnalysis, Phase, ScoreBand};
use crate::session::{Notice, SessionState};

pub fn board(state: &SessionState) -> String {
    let mut out = String::new();

    let headers = &state.headers;
    if headers.white.is_some() || headers.black.is_some() {
        out.push_str(&format!(
            "{} vs {}",
            headers.white.as_deref().unwrap_or("?"),
            headers.black.as_deref().unwrap_or("?")
        ));
        if let Some(result) = &headers.result {
            out.push_str(&format!("  ({result})"));
        }
        if let Some(event) = &headers.event {
            out.push_str(&format!("  {event}"));
        }
        out.push('\n');
    }

    let replay = &state.replay;
    let highlight = replay.current_move().map(|m| (m.from, m.to));
    let pos = replay.position();

    for rank in (0..8u32).rev() {
        out.push_str(&format!("{} ", rank + 1));
        for file in 0..8u32 {
            let sq = Square::from_coords(File::new(file), Rank::new(rank));
            let symbol = pos.board().piece_at(sq).map_or('.', |p| p.char());
            let marked = highlight.is_some_and(|(from, to)| sq == from || sq == to);
            if marked {
                out.push_str(&format!("[{symbol}]"));
            } else {
                out.push_str(&format!(" {symbol} "));
            }
        }
        out.push('\n');
    }
    out.push_str("   a  b  c  d  e  f  g  h\n");

    let side = match pos.turn() {
        Color::White => "White",
        Color::Black => "Black",
    };
    let ply = replay.cursor().map_or(0, |i| i + 1);
    out.push_str(&format!(
        "Ply {ply}/{}  {side} to move",
        replay.moves().len()
    ));
    if let Some(mv) = replay.current_move() {
        out.push_str(&format!("  last: {}", mv.san));
    }
    out.push('\n');
    out.push_str(&format!("FEN: {}\n", replay.fen()));
    out
}

/// Numbered move list with the displayed move in brackets.
pub fn moves(replay: &Replay) -> String {
    if replay.is_empty() {
        return "No moves yet.".to_string();
    }
    let mut out = String::new();
    for (i, mv) in replay.moves().iter().enumerate() {
        if i % 2 == 0 {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("{:>3}. ", i / 2 + 1));
        } else {
            out.push(' ');
        }
        if replay.cursor() == Some(i) {
            out.push_str(&format!("[{}]", mv.san));
        } else {
            out.push_str(&mv.san);
        }
    }
    out
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Strong => "strong",
        ScoreBand::Fair => "fair",
        ScoreBand::Weak => "needs work",
    }
}

pub fn report(analysis: Option<&FullAnalysis>) -> String {
    let Some(analysis) = analysis else {
        return "No analysis yet. Type 'analyze' to request one.".to_string();
    };

    let mut out = String::new();
    for phase in Phase::ALL {
        let p = analysis.phase(phase);
        out.push_str(&format!(
            "{:<11} {:>3}/100 ({})\n",
            phase.label(),
            p.clamped_score(),
            band_label(p.band())
        ));
        if !p.feedback.is_empty() {
            out.push_str(&format!("    {}\n", p.feedback));
        }
        for err in &p.errors {
            out.push_str(&format!("    - {err}\n"));
        }
    }
    out.push_str(&format!("\nAdvice: {}\n", analysis.overall_advice));
    if !analysis.referenced_books.is_empty() {
        out.push_str("Reading:\n");
        for book in &analysis.referenced_books {
            out.push_str(&format!("  * {book}\n"));
        }
    }
    out
}

pub fn games(games: &[GameSummary]) -> String {
    if games.is_empty() {
        return "No games listed. Use 'search <username>' first.".to_string();
    }
    games
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let date = g
                .created_at()
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "?".to_string());
            format!(
                "{:>2}. {} vs {}  {}  {} ({})  [{}]",
                i + 1,
                g.white_name,
                g.black_name,
                date,
                g.status,
                g.variant,
                g.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn chat(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return "No messages yet. Use 'chat <question>' to ask the coach.".to_string();
    }
    messages
        .iter()
        .map(|m| match m.role {
            ChatRole::User => format!("You: {}", m.content),
            ChatRole::Assistant => format!("Coach: {}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Error and notice lines for the current state, if any.
pub fn status(state: &SessionState) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(Notice::ContinuationDiscarded { from_ply, moves }) = &state.notice {
        lines.push(format!(
            "Note: the game continued differently after ply {}; dropped {}",
            from_ply - 1,
            moves.join(" ")
        ));
    }
    if let Some(err) = &state.error {
        lines.push(format!("Error: {}", err.user_message()));
    }
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coaching::PhaseAnalysis;
    use crate::error::SessionError;

    #[test]
    fn test_board_marks_last_move() {
        let state = SessionState {
            replay: Replay::from_pgn("1. e4").unwrap(),
            ..Default::default()
        };
        let text = board(&state);
        assert!(text.contains("4  .  .  .  . [P]"));
        assert!(text.contains("Ply 1/1  Black to move  last: e4"));
        assert!(text.starts_with("8  r  n  b  q  k  b  n  r"));
    }

    #[test]
    fn test_moves_list_marks_cursor() {
        let mut replay = Replay::from_pgn("1. e4 e5 2. Nf3").unwrap();
        replay.navigate_to(Some(1));
        assert_eq!(moves(&replay), "  1. e4 [e5]\n  2. Nf3");
        assert_eq!(moves(&Replay::default()), "No moves yet.");
    }

    #[test]
    fn test_report_clamps_scores() {
        let phase = |score| PhaseAnalysis { score, feedback: "ok".into(), errors: vec!["14. Bxh7?".into()] };
        let analysis = FullAnalysis {
            opening: phase(140),
            middlegame: phase(50),
            tactics: phase(20),
            endgame: phase(-3),
            overall_advice: "Slow down.".into(),
            referenced_books: vec!["Logical Chess".into()],
        };
        let text = report(Some(&analysis));
        assert!(text.contains("Opening     100/100 (strong)"));
        assert!(text.contains("Middlegame   50/100 (fair)"));
        assert!(text.contains("Endgame       0/100 (needs work)"));
        assert!(text.contains("  * Logical Chess"));
    }

    #[test]
    fn test_status_uses_user_message() {
        let state = SessionState {
            error: Some(SessionError::ChatFailure("connection reset".into())),
            ..Default::default()
        };
        assert_eq!(status(&state).as_deref(), Some("Error: The coach could not reply. Please try again."));
        assert_eq!(status(&SessionState::default()), None);
    }
}
