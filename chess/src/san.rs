//! Standard Algebraic Notation formatting and parsing.
//!
//! Formatting produces full SAN: piece letter, minimal disambiguation,
//! capture marker, promotion suffix, and `+`/`#` check markers. Castling is
//! detected from cozy-chess's king-takes-rook move encoding. Parsing works
//! by generation: every legal move is formatted and compared against the
//! input, which makes the parser accept exactly the strings the formatter
//! can produce (check markers are optional on input).

use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank};

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("no legal move matches: {0}")]
    NoLegalMove(String),
    #[error("invalid SAN: {0}")]
    InvalidFormat(String),
}

/// Format a move as SAN in the given position.
///
/// The move is expected to be legal; a move whose origin square is empty
/// falls back to UCI notation rather than panicking.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return crate::uci::format_uci_move(mv);
    };

    // cozy-chess encodes castling as the king capturing its own rook
    let castling = piece == Piece::King && board.color_on(mv.to) == board.color_on(mv.from);

    let mut san = if castling {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        let capture = board.piece_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        let mut s = String::new();
        match piece {
            Piece::Pawn => {
                if capture {
                    s.push(file_char(mv.from.file()));
                }
            }
            Piece::Knight => s.push('N'),
            Piece::Bishop => s.push('B'),
            Piece::Rook => s.push('R'),
            Piece::Queen => s.push('Q'),
            Piece::King => s.push('K'),
        }
        if !matches!(piece, Piece::Pawn | Piece::King) {
            s.push_str(&disambiguator(board, mv, piece));
        }
        if capture {
            s.push('x');
        }
        s.push(file_char(mv.to.file()));
        s.push(rank_char(mv.to.rank()));
        if let Some(promo) = mv.promotion {
            s.push('=');
            s.push(piece_char(promo));
        }
        s
    };

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won {
            '#'
        } else {
            '+'
        });
    }

    san
}

/// Parse a SAN move against the given position.
///
/// Check markers (`+`/`#`) are accepted but not required.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = san.trim().trim_end_matches(['+', '#']);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });

    for mv in moves {
        let formatted = format_san(board, mv);
        if formatted.trim_end_matches(['+', '#']) == wanted {
            return Ok(mv);
        }
    }

    Err(SanError::NoLegalMove(san.to_string()))
}

/// Minimal origin disambiguation: file if unique, else rank, else both.
/// Only legal moves of the same piece type to the same destination count.
fn disambiguator(board: &Board, mv: Move, piece: Piece) -> String {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });

    let mut ambiguous = false;
    let mut same_file = false;
    let mut same_rank = false;
    for other in moves {
        if other.to != mv.to || other.from == mv.from {
            continue;
        }
        if board.piece_on(other.from) != Some(piece) {
            continue;
        }
        ambiguous = true;
        if other.from.file() == mv.from.file() {
            same_file = true;
        }
        if other.from.rank() == mv.from.rank() {
            same_rank = true;
        }
    }

    if !ambiguous {
        String::new()
    } else if !same_file {
        file_char(mv.from.file()).to_string()
    } else if !same_rank {
        rank_char(mv.from.rank()).to_string()
    } else {
        format!("{}{}", file_char(mv.from.file()), rank_char(mv.from.rank()))
    }
}

fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

fn rank_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
        Piece::Pawn => 'P',
    }
}
