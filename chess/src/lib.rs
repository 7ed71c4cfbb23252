pub mod fen;
pub mod game;
pub mod san;
pub mod uci;

pub use fen::{format_fen, parse_fen, FenError};
pub use game::{DrawReason, GameOutcome, MatchGame, MatchGameError};
pub use san::{format_san, parse_san, SanError};
pub use uci::{convert_uci_castling, format_uci_move, parse_uci_move, UciMoveError};
