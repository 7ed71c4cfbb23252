//! Async repository trait definitions for the persistence layer.
//!
//! Each trait abstracts over one domain aggregate. Methods return
//! `impl Future + Send` rather than using `async fn` so that the futures
//! are guaranteed `Send` — the scheduler's poll task lives in
//! `tokio::spawn`.

use std::future::Future;

use super::{
    GameCompletion, GameRecord, ModelRecord, MoveRecord, MoveSide, PersistenceError,
    ScheduleRecord,
};

/// Repository for registered language models.
///
/// The orchestration core only ever mutates a model's rating and
/// last-active timestamp; everything else belongs to administrative
/// callers.
pub trait ModelRepository: Send + Sync {
    fn create_model(
        &self,
        name: &str,
        llm_model: &str,
    ) -> impl Future<Output = Result<i64, PersistenceError>> + Send;
    fn get_model(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ModelRecord>, PersistenceError>> + Send;
    fn list_active_models(
        &self,
    ) -> impl Future<Output = Result<Vec<ModelRecord>, PersistenceError>> + Send;
    fn set_model_active(
        &self,
        id: i64,
        is_active: bool,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn update_rating(
        &self,
        id: i64,
        rating: f64,
        last_active_at: i64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn touch_last_active(
        &self,
        id: i64,
        last_active_at: i64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// Repository for match schedules.
///
/// Status transitions are forward-only; implementations only need the
/// specific transitions the scheduler drives.
pub trait ScheduleRepository: Send + Sync {
    fn create_schedule(
        &self,
        model_id: i64,
        scheduled_for: i64,
    ) -> impl Future<Output = Result<i64, PersistenceError>> + Send;
    fn get_schedule(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ScheduleRecord>, PersistenceError>> + Send;
    /// Pending schedules ordered by requested time ascending, optionally
    /// restricted to a set of model ids.
    fn list_pending(
        &self,
        model_ids: Option<&[i64]>,
    ) -> impl Future<Output = Result<Vec<ScheduleRecord>, PersistenceError>> + Send;
    fn has_pending_for_model(
        &self,
        model_id: i64,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
    fn mark_running(
        &self,
        id: i64,
        game_id: i64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn mark_completed(&self, id: i64)
        -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn mark_failed(&self, id: i64) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// Repository for games.
pub trait GameRepository: Send + Sync {
    fn create_game(
        &self,
        model_id: i64,
        opponent: &str,
        started_at: i64,
    ) -> impl Future<Output = Result<i64, PersistenceError>> + Send;
    fn get_game(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send;
    fn finalize_game(
        &self,
        id: i64,
        completion: &GameCompletion,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// Repository for recorded moves. Append-only, one row per ply.
pub trait MoveRepository: Send + Sync {
    fn insert_move(
        &self,
        game_id: i64,
        ply: i64,
        side: MoveSide,
        san: &str,
        timestamp: i64,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Moves for a game in ply order.
    fn list_moves(
        &self,
        game_id: i64,
    ) -> impl Future<Output = Result<Vec<MoveRecord>, PersistenceError>> + Send;
}

/// Bundle of repository types for one storage backend, consumed by the
/// scheduler and play loop via static dispatch. The `'static` bounds let
/// the scheduler's poll task own its repositories across `tokio::spawn`.
pub trait Persistence: Send + Sync + 'static {
    type Models: ModelRepository + 'static;
    type Schedules: ScheduleRepository + 'static;
    type Games: GameRepository + 'static;
    type Moves: MoveRepository + 'static;
}
