//! SQLite-backed repository for recorded moves.

use sqlx::SqlitePool;

use super::helpers::{decode_side, encode_side};
use crate::persistence::traits::MoveRepository;
use crate::persistence::{MoveRecord, MoveSide, PersistenceError};

/// SQLite implementation of [`MoveRepository`].
pub struct SqliteMoveRepository {
    pool: SqlitePool,
}

impl SqliteMoveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MoveRepository for SqliteMoveRepository {
    async fn insert_move(
        &self,
        game_id: i64,
        ply: i64,
        side: MoveSide,
        san: &str,
        timestamp: i64,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO moves (game_id, ply, side, san, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(game_id)
        .bind(ply)
        .bind(encode_side(side))
        .bind(san)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_moves(&self, game_id: i64) -> Result<Vec<MoveRecord>, PersistenceError> {
        let rows: Vec<(i64, i64, i64, String, String, i64)> = sqlx::query_as(
            r#"
            SELECT id, game_id, ply, side, san, timestamp
            FROM moves
            WHERE game_id = ?
            ORDER BY ply
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, game_id, ply, side, san, timestamp)| MoveRecord {
                id,
                game_id,
                ply,
                side: decode_side(&side),
                san,
                timestamp,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::{Database, SqliteGameRepository, SqliteModelRepository};
    use crate::persistence::traits::{GameRepository, ModelRepository};

    async fn test_repo() -> (Database, SqliteMoveRepository, i64) {
        let db = Database::new_in_memory().await.unwrap();
        let models = SqliteModelRepository::new(db.pool().clone());
        let model_id = models.create_model("A", "model-a").await.unwrap();
        let games = SqliteGameRepository::new(db.pool().clone());
        let game_id = games.create_game(model_id, "stockfish", 1000).await.unwrap();
        let repo = SqliteMoveRepository::new(db.pool().clone());
        (db, repo, game_id)
    }

    #[tokio::test]
    async fn test_moves_listed_in_ply_order() {
        let (_db, repo, game_id) = test_repo().await;
        repo.insert_move(game_id, 2, MoveSide::Black, "e5", 1001)
            .await
            .unwrap();
        repo.insert_move(game_id, 1, MoveSide::White, "e4", 1000)
            .await
            .unwrap();
        repo.insert_move(game_id, 3, MoveSide::White, "Nf3", 1002)
            .await
            .unwrap();

        let moves = repo.list_moves(game_id).await.unwrap();
        let sans: Vec<&str> = moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
        assert_eq!(moves[0].side, MoveSide::White);
        assert_eq!(moves[1].side, MoveSide::Black);
    }

    #[tokio::test]
    async fn test_list_moves_empty_game() {
        let (_db, repo, game_id) = test_repo().await;
        assert!(repo.list_moves(game_id).await.unwrap().is_empty());
    }
}
