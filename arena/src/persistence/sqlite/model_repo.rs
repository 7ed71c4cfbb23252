//! SQLite-backed repository for registered models.

use sqlx::SqlitePool;

use crate::persistence::traits::ModelRepository;
use crate::persistence::{now_timestamp, ModelRecord, PersistenceError};

/// SQLite implementation of [`ModelRepository`].
pub struct SqliteModelRepository {
    pool: SqlitePool,
}

impl SqliteModelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

type ModelRow = (i64, String, String, f64, i64, Option<i64>, i64);

fn decode_model(row: ModelRow) -> ModelRecord {
    let (id, name, llm_model, rating, is_active, last_active_at, created_at) = row;
    ModelRecord {
        id,
        name,
        llm_model,
        rating,
        is_active: is_active != 0,
        last_active_at,
        created_at,
    }
}

impl ModelRepository for SqliteModelRepository {
    async fn create_model(&self, name: &str, llm_model: &str) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO models (name, llm_model, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(llm_model)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_model(&self, id: i64) -> Result<Option<ModelRecord>, PersistenceError> {
        let row: Option<ModelRow> = sqlx::query_as(
            r#"
            SELECT id, name, llm_model, rating, is_active, last_active_at, created_at
            FROM models
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(decode_model))
    }

    async fn list_active_models(&self) -> Result<Vec<ModelRecord>, PersistenceError> {
        let rows: Vec<ModelRow> = sqlx::query_as(
            r#"
            SELECT id, name, llm_model, rating, is_active, last_active_at, created_at
            FROM models
            WHERE is_active = 1
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(decode_model).collect())
    }

    async fn set_model_active(&self, id: i64, is_active: bool) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE models SET is_active = ? WHERE id = ?")
            .bind(i64::from(is_active))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_rating(
        &self,
        id: i64,
        rating: f64,
        last_active_at: i64,
    ) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE models SET rating = ?, last_active_at = ? WHERE id = ?")
            .bind(rating)
            .bind(last_active_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn touch_last_active(&self, id: i64, last_active_at: i64) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE models SET last_active_at = ? WHERE id = ?")
            .bind(last_active_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;

    async fn test_repo() -> (Database, SqliteModelRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteModelRepository::new(db.pool().clone());
        (db, repo)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_db, repo) = test_repo().await;
        let id = repo.create_model("GPT Test", "openai/gpt-test").await.unwrap();
        let model = repo.get_model(id).await.unwrap().unwrap();
        assert_eq!(model.name, "GPT Test");
        assert_eq!(model.llm_model, "openai/gpt-test");
        assert_eq!(model.rating, 1200.0);
        assert!(model.is_active);
        assert_eq!(model.last_active_at, None);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (_db, repo) = test_repo().await;
        assert_eq!(repo.get_model(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_active_excludes_deactivated() {
        let (_db, repo) = test_repo().await;
        let a = repo.create_model("A", "model-a").await.unwrap();
        let b = repo.create_model("B", "model-b").await.unwrap();
        repo.set_model_active(b, false).await.unwrap();

        let active = repo.list_active_models().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a);
    }

    #[tokio::test]
    async fn test_update_rating() {
        let (_db, repo) = test_repo().await;
        let id = repo.create_model("A", "model-a").await.unwrap();
        repo.update_rating(id, 1232.0, 1_700_000_000).await.unwrap();

        let model = repo.get_model(id).await.unwrap().unwrap();
        assert_eq!(model.rating, 1232.0);
        assert_eq!(model.last_active_at, Some(1_700_000_000));
    }

    #[tokio::test]
    async fn test_touch_last_active_keeps_rating() {
        let (_db, repo) = test_repo().await;
        let id = repo.create_model("A", "model-a").await.unwrap();
        repo.touch_last_active(id, 1_700_000_000).await.unwrap();

        let model = repo.get_model(id).await.unwrap().unwrap();
        assert_eq!(model.rating, 1200.0);
        assert_eq!(model.last_active_at, Some(1_700_000_000));
    }
}
