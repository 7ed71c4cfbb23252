use std::collections::HashMap;

use cozy_chess::{Board, Color, GameStatus, Move, Piece};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::san::format_san;
use crate::uci::format_uci_move;

/// Game state wrapper around a cozy-chess Board.
///
/// Tracks the SAN move history and enough position history to detect the
/// draw conditions the bare board does not: threefold repetition and
/// insufficient material. Checkmate, stalemate, and the fifty-move rule
/// come from `Board::status()`.
#[derive(Debug, Clone)]
pub struct MatchGame {
    position: Board,
    san_history: Vec<String>,
    seen_positions: HashMap<u64, u32>,
}

/// Final result of a game, from White's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw(DrawReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    FiftyMoveRule,
    Repetition,
    InsufficientMaterial,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchGameError {
    #[error("illegal move: {0}")]
    IllegalMove(String),
    #[error(transparent)]
    Fen(#[from] FenError),
}

impl MatchGame {
    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        Self::with_board(Board::default())
    }

    /// Create a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, MatchGameError> {
        Ok(Self::with_board(parse_fen(fen)?))
    }

    fn with_board(position: Board) -> Self {
        let mut seen_positions = HashMap::new();
        seen_positions.insert(position.hash(), 1);
        Self {
            position,
            san_history: Vec::new(),
            seen_positions,
        }
    }

    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn to_fen(&self) -> String {
        format_fen(&self.position)
    }

    /// Number of half-moves played so far.
    pub fn ply_count(&self) -> usize {
        self.san_history.len()
    }

    pub fn san_history(&self) -> &[String] {
        &self.san_history
    }

    /// All legal moves in the current position.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// All legal moves as SAN strings, in move-generator order.
    pub fn legal_moves_san(&self) -> Vec<String> {
        self.legal_moves()
            .into_iter()
            .map(|mv| format_san(&self.position, mv))
            .collect()
    }

    /// Play a move, returning its SAN form.
    pub fn make_move(&mut self, mv: Move) -> Result<String, MatchGameError> {
        if !self.legal_moves().contains(&mv) {
            return Err(MatchGameError::IllegalMove(format_uci_move(mv)));
        }

        let san = format_san(&self.position, mv);
        self.position.play_unchecked(mv);
        *self.seen_positions.entry(self.position.hash()).or_insert(0) += 1;
        self.san_history.push(san.clone());
        Ok(san)
    }

    /// Terminal outcome of the current position, or None while the game is
    /// still playable.
    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.position.status() {
            GameStatus::Won => Some(match self.position.side_to_move() {
                Color::White => GameOutcome::BlackWins,
                Color::Black => GameOutcome::WhiteWins,
            }),
            GameStatus::Drawn => {
                if self.legal_moves().is_empty() {
                    Some(GameOutcome::Draw(DrawReason::Stalemate))
                } else {
                    Some(GameOutcome::Draw(DrawReason::FiftyMoveRule))
                }
            }
            GameStatus::Ongoing => {
                let occurrences = self
                    .seen_positions
                    .get(&self.position.hash())
                    .copied()
                    .unwrap_or(0);
                if occurrences >= 3 {
                    Some(GameOutcome::Draw(DrawReason::Repetition))
                } else if self.insufficient_material() {
                    Some(GameOutcome::Draw(DrawReason::InsufficientMaterial))
                } else {
                    None
                }
            }
        }
    }

    /// Neither side can deliver mate: bare kings, a lone minor piece, or
    /// bishops that all share one square color.
    fn insufficient_material(&self) -> bool {
        let board = &self.position;
        let heavy = board.pieces(Piece::Pawn)
            | board.pieces(Piece::Rook)
            | board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }

        let knights = board.pieces(Piece::Knight);
        let bishops = board.pieces(Piece::Bishop);
        let minors = knights.len() + bishops.len();
        if minors <= 1 {
            return true;
        }
        if knights.is_empty() {
            let mut parities = bishops
                .into_iter()
                .map(|sq| (sq.file() as u8 + sq.rank() as u8) % 2);
            let first = parities.next();
            return parities.all(|p| Some(p) == first);
        }
        false
    }
}

impl Default for MatchGame {
    fn default() -> Self {
        Self::new()
    }
}
