//! Shared encode/decode helpers for SQLite ↔ domain type conversions.
//!
//! These functions bridge the gap between domain enums and the TEXT
//! columns used in the SQLite schema's CHECK constraints.

use crate::persistence::{GameResult, MatchStatus, MoveSide};

// ── MatchStatus ────────────────────────────────────────────────────────

pub fn encode_status(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Pending => "pending",
        MatchStatus::Running => "running",
        MatchStatus::Completed => "completed",
        MatchStatus::Failed => "failed",
    }
}

pub fn decode_status(status: &str) -> MatchStatus {
    match status {
        "running" => MatchStatus::Running,
        "completed" => MatchStatus::Completed,
        "failed" => MatchStatus::Failed,
        _ => MatchStatus::Pending,
    }
}

// ── GameResult ─────────────────────────────────────────────────────────

pub fn encode_result(result: GameResult) -> &'static str {
    match result {
        GameResult::Win => "win",
        GameResult::Loss => "loss",
        GameResult::Draw => "draw",
    }
}

pub fn decode_result(result: Option<&str>) -> Option<GameResult> {
    match result {
        Some("win") => Some(GameResult::Win),
        Some("loss") => Some(GameResult::Loss),
        Some("draw") => Some(GameResult::Draw),
        _ => None,
    }
}

// ── MoveSide ───────────────────────────────────────────────────────────

pub fn encode_side(side: MoveSide) -> &'static str {
    match side {
        MoveSide::White => "white",
        MoveSide::Black => "black",
    }
}

pub fn decode_side(side: &str) -> MoveSide {
    match side {
        "black" => MoveSide::Black,
        _ => MoveSide::White,
    }
}
