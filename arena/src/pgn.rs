//! PGN transcript rendering and storage.
//!
//! Produces a header block plus numbered movetext wrapped at 80 columns,
//! and writes one `game_<id>.pgn` file per finished game.

use std::io;
use std::path::{Path, PathBuf};

use crate::persistence::GameResult;

const MAX_LINE_WIDTH: usize = 80;

/// Header values for one game's transcript.
#[derive(Debug, Clone)]
pub struct PgnHeaders {
    pub event: String,
    pub date: String,
    pub white: String,
    pub black: String,
    pub result: String,
}

/// PGN result code for a game outcome, from the perspective of a model
/// playing White.
pub fn result_code(result: GameResult) -> &'static str {
    match result {
        GameResult::Win => "1-0",
        GameResult::Loss => "0-1",
        GameResult::Draw => "1/2-1/2",
    }
}

/// Render headers and SAN movetext as a PGN document.
pub fn render(headers: &PgnHeaders, moves: &[String]) -> String {
    let mut pgn = String::new();
    pgn.push_str(&format!("[Event \"{}\"]\n", headers.event));
    pgn.push_str(&format!("[Date \"{}\"]\n", headers.date));
    pgn.push_str(&format!("[White \"{}\"]\n", headers.white));
    pgn.push_str(&format!("[Black \"{}\"]\n", headers.black));
    pgn.push_str(&format!("[Result \"{}\"]\n", headers.result));
    pgn.push('\n');

    let mut tokens: Vec<String> = Vec::with_capacity(moves.len() + 1);
    for (i, san) in moves.iter().enumerate() {
        if i % 2 == 0 {
            tokens.push(format!("{}.", i / 2 + 1));
        }
        tokens.push(san.clone());
    }
    tokens.push(headers.result.clone());

    let mut line_len = 0;
    for (i, token) in tokens.iter().enumerate() {
        if i == 0 {
            pgn.push_str(token);
            line_len = token.len();
        } else if line_len + 1 + token.len() > MAX_LINE_WIDTH {
            pgn.push('\n');
            pgn.push_str(token);
            line_len = token.len();
        } else {
            pgn.push(' ');
            pgn.push_str(token);
            line_len += 1 + token.len();
        }
    }
    pgn.push('\n');
    pgn
}

/// Write a rendered transcript to `<dir>/game_<id>.pgn`.
pub fn write_game(dir: &Path, game_id: i64, pgn: &str) -> io::Result<PathBuf> {
    let path = dir.join(format!("game_{}.pgn", game_id));
    std::fs::write(&path, pgn)?;
    Ok(path)
}
