use cozy_chess::Board;

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    fen.parse().map_err(|_| FenError::Invalid(fen.to_string()))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("invalid FEN: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_roundtrip_start_position() {
        let board = parse_fen(START_FEN).unwrap();
        assert_eq!(format_fen(&board), START_FEN);
    }

    #[test]
    fn test_default_board_is_start_position() {
        assert_eq!(format_fen(&Board::default()), START_FEN);
    }

    #[test]
    fn test_invalid_fen_rejected() {
        assert!(parse_fen("not a fen").is_err());
        assert!(parse_fen("").is_err());
    }
}
