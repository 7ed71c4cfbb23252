//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode** — allows one writer and multiple concurrent readers.
//! - **Foreign keys enabled** — enforced at the connection level.
//! - **Embedded migrations** — `sqlx::migrate!` runs
//!   `migrations/001_initial_schema.sql` automatically when
//!   [`Database::open`] is called. The schema is idempotent.
//!
//! ## Repository types
//!
//! Each `Sqlite*Repository` holds a `SqlitePool` clone and implements the
//! corresponding trait from [`crate::persistence::traits`]:
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqliteModelRepository`] | `ModelRepository` |
//! | [`SqliteScheduleRepository`] | `ScheduleRepository` |
//! | [`SqliteGameRepository`] | `GameRepository` |
//! | [`SqliteMoveRepository`] | `MoveRepository` |
//!
//! Enum columns (match status, game result, move side) are stored as `TEXT`
//! constrained by CHECK clauses and round-tripped through the shared
//! encode/decode helpers in [`helpers`].

mod database;
mod game_repo;
pub(crate) mod helpers;
mod model_repo;
mod move_repo;
mod schedule_repo;

pub use database::Database;
pub use game_repo::SqliteGameRepository;
pub use model_repo::SqliteModelRepository;
pub use move_repo::SqliteMoveRepository;
pub use schedule_repo::SqliteScheduleRepository;

use super::Persistence;

/// The SQLite storage backend.
pub struct SqlitePersistence;

impl Persistence for SqlitePersistence {
    type Models = SqliteModelRepository;
    type Schedules = SqliteScheduleRepository;
    type Games = SqliteGameRepository;
    type Moves = SqliteMoveRepository;
}
