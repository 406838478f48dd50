//! PGN text utilities — regex-based header lookup and movetext rendering.

use regex::Regex;

use crate::game_data::GameHeaders;

/// Read the display headers (White, Black, Result, Event) from a PGN string.
/// Missing or empty tags come back as `None`.
pub fn parse_headers(pgn: &str) -> GameHeaders {
    GameHeaders {
        white: extract_header(pgn, "White"),
        black: extract_header(pgn, "Black"),
        result: extract_header(pgn, "Result"),
        event: extract_header(pgn, "Event"),
    }
}

/// Extract a string value from a PGN header (e.g. White, Event).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

/// Render SAN moves as numbered movetext, e.g. `1. e4 e5 2. Nf3`.
pub fn format_movetext<S: AsRef<str>>(sans: &[S]) -> String {
    format_movetext_from(sans, 1, false)
}

/// Numbered movetext starting at move `fullmove`. When Black moves first the
/// opening move is written `N... san`.
pub fn format_movetext_from<S: AsRef<str>>(sans: &[S], fullmove: u32, black_first: bool) -> String {
    let offset = usize::from(black_first);
    let mut out = String::new();
    for (i, san) in sans.iter().enumerate() {
        let ply = i + offset;
        let number = fullmove as usize + ply / 2;
        if ply % 2 == 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("{number}. "));
        } else if i == 0 {
            out.push_str(&format!("{number}... "));
        } else {
            out.push(' ');
        }
        out.push_str(san.as_ref());
    }
    out
}

/// Count the move tokens in the main line of the movetext (after removing
/// headers, comments, variations, move numbers, NAGs and the result).
///
/// The PGN tokenizer skips anything it cannot read as SAN, so this count is
/// what lets the replay reject free text that happens to contain no moves.
pub fn count_move_tokens(pgn: &str) -> Option<usize> {
    let header_re = Regex::new(r#"\[\w+\s+"(?:[^"\\]|\\.)*"\s*\]"#).ok()?;
    let no_headers = header_re.replace_all(pgn, "");

    let comment_re = Regex::new(r"\{[^}]*\}|;[^\n]*").ok()?;
    let mut movetext = comment_re.replace_all(&no_headers, " ").into_owned();

    // Innermost variations first so nested ones collapse too
    let variation_re = Regex::new(r"\([^()]*\)").ok()?;
    while variation_re.is_match(&movetext) {
        movetext = variation_re.replace_all(&movetext, " ").into_owned();
    }

    let move_number_re = Regex::new(r"^\d+\.*").ok()?;
    let count = movetext
        .split_whitespace()
        .filter(|token| !matches!(*token, "1-0" | "0-1" | "1/2-1/2" | "*"))
        .map(|token| move_number_re.replace(token, ""))
        .filter(|token| {
            !token.is_empty()
                && !token.starts_with('$')
                && !token.chars().all(|c| c == '!' || c == '?')
        })
        .count();

    Some(count)
}
