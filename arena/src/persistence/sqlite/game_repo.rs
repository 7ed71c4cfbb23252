//! SQLite-backed repository for games.

use sqlx::SqlitePool;

use super::helpers::{decode_result, encode_result};
use crate::persistence::traits::GameRepository;
use crate::persistence::{GameCompletion, GameRecord, PersistenceError};

/// SQLite implementation of [`GameRepository`].
pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

type GameRow = (
    i64,
    i64,
    String,
    i64,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
);

fn decode_game(row: GameRow) -> GameRecord {
    let (id, model_id, opponent, started_at, completed_at, result, pgn_path, opening, moves_count) =
        row;
    GameRecord {
        id,
        model_id,
        opponent,
        started_at,
        completed_at,
        result: decode_result(result.as_deref()),
        pgn_path,
        opening,
        moves_count,
    }
}

impl GameRepository for SqliteGameRepository {
    async fn create_game(
        &self,
        model_id: i64,
        opponent: &str,
        started_at: i64,
    ) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO games (model_id, opponent, started_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(model_id)
        .bind(opponent)
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_game(&self, id: i64) -> Result<Option<GameRecord>, PersistenceError> {
        let row: Option<GameRow> = sqlx::query_as(
            r#"
            SELECT id, model_id, opponent, started_at, completed_at, result,
                   pgn_path, opening, moves_count
            FROM games
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(decode_game))
    }

    async fn finalize_game(
        &self,
        id: i64,
        completion: &GameCompletion,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            UPDATE games
            SET completed_at = ?, result = ?, moves_count = ?, opening = ?, pgn_path = ?
            WHERE id = ?
            "#,
        )
        .bind(completion.completed_at)
        .bind(encode_result(completion.result))
        .bind(completion.moves_count)
        .bind(completion.opening.as_deref())
        .bind(completion.pgn_path.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
