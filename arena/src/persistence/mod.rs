pub mod sqlite;
mod traits;

pub use sqlite::{
    Database, SqliteGameRepository, SqliteModelRepository, SqliteMoveRepository,
    SqlitePersistence, SqliteScheduleRepository,
};
pub use traits::{
    GameRepository, ModelRepository, MoveRepository, Persistence, ScheduleRepository,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("migration failed: {0}")]
    Migration(String),
}

/// Lifecycle of a match schedule. Forward-only:
/// `Pending → Running → {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Outcome of a game, always from the model's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSide {
    White,
    Black,
}

/// A registered language model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub id: i64,
    pub name: String,
    /// Identifier sent to the chat-completion endpoint.
    pub llm_model: String,
    pub rating: f64,
    pub is_active: bool,
    pub last_active_at: Option<i64>,
    pub created_at: i64,
}

/// One requested match.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRecord {
    pub id: i64,
    pub model_id: i64,
    pub scheduled_for: i64,
    pub status: MatchStatus,
    pub game_id: Option<i64>,
}

/// One played (or in-progress) contest.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub id: i64,
    pub model_id: i64,
    pub opponent: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub result: Option<GameResult>,
    pub pgn_path: Option<String>,
    pub opening: Option<String>,
    pub moves_count: i64,
}

/// Fields written when a game finishes.
#[derive(Debug, Clone)]
pub struct GameCompletion {
    pub completed_at: i64,
    pub result: GameResult,
    pub moves_count: i64,
    pub opening: Option<String>,
    pub pgn_path: Option<String>,
}

/// One recorded ply.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRecord {
    pub id: i64,
    pub game_id: i64,
    pub ply: i64,
    pub side: MoveSide,
    pub san: String,
    pub timestamp: i64,
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
