//! SQLite-backed repository for match schedules.

use sqlx::SqlitePool;

use super::helpers::{decode_status, encode_status};
use crate::persistence::traits::ScheduleRepository;
use crate::persistence::{MatchStatus, PersistenceError, ScheduleRecord};

/// SQLite implementation of [`ScheduleRepository`].
pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

type ScheduleRow = (i64, i64, i64, String, Option<i64>);

fn decode_schedule(row: ScheduleRow) -> ScheduleRecord {
    let (id, model_id, scheduled_for, status, game_id) = row;
    ScheduleRecord {
        id,
        model_id,
        scheduled_for,
        status: decode_status(&status),
        game_id,
    }
}

impl ScheduleRepository for SqliteScheduleRepository {
    async fn create_schedule(
        &self,
        model_id: i64,
        scheduled_for: i64,
    ) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO match_schedules (model_id, scheduled_for, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(model_id)
        .bind(scheduled_for)
        .bind(encode_status(MatchStatus::Pending))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_schedule(&self, id: i64) -> Result<Option<ScheduleRecord>, PersistenceError> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            r#"
            SELECT id, model_id, scheduled_for, status, game_id
            FROM match_schedules
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(decode_schedule))
    }

    async fn list_pending(
        &self,
        model_ids: Option<&[i64]>,
    ) -> Result<Vec<ScheduleRecord>, PersistenceError> {
        let rows: Vec<ScheduleRow> = match model_ids {
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, model_id, scheduled_for, status, game_id
                    FROM match_schedules
                    WHERE status = 'pending'
                    ORDER BY scheduled_for, id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            Some(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                // sqlx has no array binds for SQLite; expand placeholders
                let placeholders = vec!["?"; ids.len()].join(", ");
                let sql = format!(
                    "SELECT id, model_id, scheduled_for, status, game_id \
                     FROM match_schedules \
                     WHERE status = 'pending' AND model_id IN ({placeholders}) \
                     ORDER BY scheduled_for, id"
                );
                let mut query = sqlx::query_as(&sql);
                for id in ids {
                    query = query.bind(*id);
                }
                query.fetch_all(&self.pool).await?
            }
        };

        Ok(rows.into_iter().map(decode_schedule).collect())
    }

    async fn has_pending_for_model(&self, model_id: i64) -> Result<bool, PersistenceError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM match_schedules WHERE model_id = ? AND status = 'pending' LIMIT 1",
        )
        .bind(model_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn mark_running(&self, id: i64, game_id: i64) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE match_schedules SET status = ?, game_id = ? WHERE id = ?")
            .bind(encode_status(MatchStatus::Running))
            .bind(game_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_completed(&self, id: i64) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE match_schedules SET status = ? WHERE id = ?")
            .bind(encode_status(MatchStatus::Completed))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_failed(&self, id: i64) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE match_schedules SET status = ? WHERE id = ?")
            .bind(encode_status(MatchStatus::Failed))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::{Database, SqliteModelRepository};
    use crate::persistence::traits::ModelRepository;

    async fn test_repo() -> (Database, SqliteScheduleRepository, i64) {
        let db = Database::new_in_memory().await.unwrap();
        let models = SqliteModelRepository::new(db.pool().clone());
        let model_id = models.create_model("A", "model-a").await.unwrap();
        let repo = SqliteScheduleRepository::new(db.pool().clone());
        (db, repo, model_id)
    }

    #[tokio::test]
    async fn test_create_is_pending() {
        let (_db, repo, model_id) = test_repo().await;
        let id = repo.create_schedule(model_id, 100).await.unwrap();
        let schedule = repo.get_schedule(id).await.unwrap().unwrap();
        assert_eq!(schedule.status, MatchStatus::Pending);
        assert_eq!(schedule.model_id, model_id);
        assert_eq!(schedule.game_id, None);
    }

    #[tokio::test]
    async fn test_list_pending_ordered_by_requested_time() {
        let (_db, repo, model_id) = test_repo().await;
        let late = repo.create_schedule(model_id, 300).await.unwrap();
        let early = repo.create_schedule(model_id, 100).await.unwrap();
        let mid = repo.create_schedule(model_id, 200).await.unwrap();

        let pending = repo.list_pending(None).await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![early, mid, late]);
    }

    #[tokio::test]
    async fn test_list_pending_filters_by_model() {
        let (db, repo, model_a) = test_repo().await;
        let models = SqliteModelRepository::new(db.pool().clone());
        let model_b = models.create_model("B", "model-b").await.unwrap();

        repo.create_schedule(model_a, 100).await.unwrap();
        let b_schedule = repo.create_schedule(model_b, 100).await.unwrap();

        let pending = repo.list_pending(Some(&[model_b])).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b_schedule);

        let none = repo.list_pending(Some(&[])).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_state_transitions_leave_pending_set() {
        let (db, repo, model_id) = test_repo().await;
        let games = crate::persistence::sqlite::SqliteGameRepository::new(db.pool().clone());
        let game_id = {
            use crate::persistence::traits::GameRepository;
            games.create_game(model_id, "stockfish", 100).await.unwrap()
        };
        let id = repo.create_schedule(model_id, 100).await.unwrap();

        repo.mark_running(id, game_id).await.unwrap();
        let schedule = repo.get_schedule(id).await.unwrap().unwrap();
        assert_eq!(schedule.status, MatchStatus::Running);
        assert_eq!(schedule.game_id, Some(game_id));
        assert!(repo.list_pending(None).await.unwrap().is_empty());

        repo.mark_completed(id).await.unwrap();
        assert_eq!(
            repo.get_schedule(id).await.unwrap().unwrap().status,
            MatchStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_mark_failed() {
        let (_db, repo, model_id) = test_repo().await;
        let id = repo.create_schedule(model_id, 100).await.unwrap();
        repo.mark_failed(id).await.unwrap();
        assert_eq!(
            repo.get_schedule(id).await.unwrap().unwrap().status,
            MatchStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_has_pending_for_model() {
        let (_db, repo, model_id) = test_repo().await;
        assert!(!repo.has_pending_for_model(model_id).await.unwrap());
        let id = repo.create_schedule(model_id, 100).await.unwrap();
        assert!(repo.has_pending_for_model(model_id).await.unwrap());
        repo.mark_failed(id).await.unwrap();
        assert!(!repo.has_pending_for_model(model_id).await.unwrap());
    }
}
