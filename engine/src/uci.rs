//! Line parser for the subset of the UCI protocol the provider drives.

use chess::uci::{parse_uci_move, UciMoveError};
use cozy_chess::Move;

/// Incoming message from a UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `bestmove (none)` (no legal move in the searched position) is
    /// represented as `BestMove(None)`.
    BestMove(Option<Move>),
}

#[derive(Debug, thiserror::Error)]
pub enum UciParseError {
    #[error("malformed UCI message: {0}")]
    Malformed(String),
    #[error("unknown UCI message: {0}")]
    Unknown(String),
    #[error(transparent)]
    Move(#[from] UciMoveError),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciParseError::Malformed(line.to_string()));
            }
            Ok(UciMessage::Id {
                name: tokens[1].to_string(),
                value: tokens[2..].join(" "),
            })
        }

        Some(&"bestmove") => {
            let mv = match tokens.get(1) {
                None => return Err(UciParseError::Malformed(line.to_string())),
                Some(&"(none)") => None,
                Some(raw) => Some(parse_uci_move(raw)?),
            };
            Ok(UciMessage::BestMove(mv))
        }

        _ => Err(UciParseError::Unknown(line.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::uci::format_uci_move;

    #[test]
    fn test_parse_uciok_and_readyok() {
        assert!(matches!(parse_uci_message("uciok"), Ok(UciMessage::UciOk)));
        assert!(matches!(
            parse_uci_message("readyok"),
            Ok(UciMessage::ReadyOk)
        ));
    }

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        match msg {
            UciMessage::BestMove(Some(mv)) => assert_eq!(format_uci_move(mv), "e2e4"),
            other => panic!("wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_uci_message("bestmove (none)").unwrap();
        assert!(matches!(msg, UciMessage::BestMove(None)));
    }

    #[test]
    fn test_parse_bestmove_promotion() {
        let msg = parse_uci_message("bestmove e7e8q").unwrap();
        match msg {
            UciMessage::BestMove(Some(mv)) => assert_eq!(format_uci_move(mv), "e7e8q"),
            other => panic!("wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_id() {
        let msg = parse_uci_message("id name Stockfish 16").unwrap();
        match msg {
            UciMessage::Id { name, value } => {
                assert_eq!(name, "name");
                assert_eq!(value, "Stockfish 16");
            }
            other => panic!("wrong message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_message() {
        assert!(matches!(
            parse_uci_message("info depth 12"),
            Err(UciParseError::Unknown(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove"),
            Err(UciParseError::Malformed(_))
        ));
    }
}
