//! Match scheduling: polls for pending schedules and drives each through
//! the `Pending → Running → {Completed | Failed}` state machine.
//!
//! One background task polls at a fixed interval; dispatch within a pass is
//! strictly sequential. The scheduler is the terminal error boundary: a
//! failing match is recorded and logged, never allowed to abort the poll
//! loop.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use engine::{EngineError, EngineProvider};
use model_client::{ModelClient, ModelClientError};

use crate::persistence::{
    now_timestamp, GameRepository, MatchStatus, ModelRepository, Persistence, PersistenceError,
    ScheduleRepository,
};
use crate::play::{play_game, PlayContext};
use crate::ratings::{adjust_rating, STOCKFISH_RATING};

const OPPONENT_TAG: &str = "stockfish";

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("engine startup failed: {0}")]
    Engine(#[from] EngineError),
    #[error("model client startup failed: {0}")]
    ModelClient(#[from] ModelClientError),
    #[error("failed to create PGN directory: {0}")]
    PgnDir(std::io::Error),
}

pub struct SchedulerConfig {
    pub poll_interval: Duration,
    pub dry_run: bool,
    /// Scripted UCI moves for dry-run scenarios, consumed across games.
    pub scripted_moves: Vec<String>,
    pub pgn_dir: PathBuf,
}

pub struct MatchScheduler<D: Persistence> {
    models: Arc<D::Models>,
    schedules: Arc<D::Schedules>,
    play: PlayContext<D>,
    poll_interval: Duration,
    dry_run: bool,
    poll: Mutex<Option<PollTask>>,
}

struct PollTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl<D: Persistence> MatchScheduler<D> {
    pub fn new(
        models: Arc<D::Models>,
        schedules: Arc<D::Schedules>,
        games: Arc<D::Games>,
        moves: Arc<D::Moves>,
        engine: Option<Arc<EngineProvider>>,
        model_client: Option<Arc<ModelClient>>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        std::fs::create_dir_all(&config.pgn_dir).map_err(SchedulerError::PgnDir)?;
        let scripted_mode = !config.scripted_moves.is_empty();
        Ok(Self {
            models,
            schedules,
            play: PlayContext {
                games,
                moves,
                engine,
                model_client,
                scripted: Mutex::new(VecDeque::from(config.scripted_moves)),
                scripted_mode,
                dry_run: config.dry_run,
                pgn_dir: config.pgn_dir,
            },
            poll_interval: config.poll_interval,
            dry_run: config.dry_run,
            poll: Mutex::new(None),
        })
    }

    /// Begin the background poll loop. Idempotent; providers are readied
    /// first.
    pub async fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let mut poll = self.poll.lock().await;
        if poll.is_some() {
            return Ok(());
        }
        self.ensure_providers_ready().await?;

        let (shutdown, mut rx) = watch::channel(false);
        let scheduler = Arc::clone(self);
        let interval = self.poll_interval;
        let handle = tokio::spawn(async move {
            tracing::info!("scheduler poll task started");
            loop {
                // The shutdown signal wins at every suspension point: an
                // in-flight pass is dropped rather than awaited.
                tokio::select! {
                    _ = rx.changed() => break,
                    result = scheduler.process_pending(None) => {
                        if let Err(e) = result {
                            tracing::error!("poll pass failed: {e}");
                        }
                    }
                }
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::info!("scheduler poll task exiting");
        });

        *poll = Some(PollTask { shutdown, handle });
        Ok(())
    }

    /// Cancel the background poll, await its termination, then shut down
    /// both providers. Idempotent; nothing mutates persisted state after
    /// this returns.
    pub async fn stop(&self) {
        let task = self.poll.lock().await.take();
        if let Some(task) = task {
            let _ = task.shutdown.send(true);
            if let Err(e) = task.handle.await {
                if !e.is_cancelled() {
                    tracing::error!("poll task failed: {e}");
                }
            }
        }
        if let Some(client) = self.play.model_client.as_ref() {
            client.close().await;
        }
        if let Some(engine) = self.play.engine.as_ref() {
            engine.stop().await;
        }
    }

    /// One synchronous pass over pending matches, optionally restricted to
    /// specific model identifiers. Non-numeric identifiers are silently
    /// dropped; a filter with no usable identifiers left is treated as no
    /// filter at all.
    pub async fn run_once(&self, model_ids: Option<&[String]>) -> Result<(), SchedulerError> {
        self.ensure_providers_ready().await?;
        let ids = model_ids.map(coerce_model_ids).unwrap_or_default();
        let filter = if ids.is_empty() {
            None
        } else {
            Some(ids.as_slice())
        };
        self.process_pending(filter).await?;
        Ok(())
    }

    /// Create a pending schedule for every active model (optionally
    /// filtered) that has none. Returns the number created.
    pub async fn seed_schedules(
        &self,
        model_ids: Option<&[i64]>,
    ) -> Result<usize, PersistenceError> {
        let mut created = 0;
        for model in self.models.list_active_models().await? {
            if let Some(ids) = model_ids {
                if !ids.contains(&model.id) {
                    continue;
                }
            }
            if !self.schedules.has_pending_for_model(model.id).await? {
                self.schedules
                    .create_schedule(model.id, now_timestamp())
                    .await?;
                created += 1;
            }
        }
        tracing::debug!(created, "seeded match schedules");
        Ok(created)
    }

    /// Query pending schedules in requested-time order and dispatch them
    /// one at a time.
    async fn process_pending(&self, model_ids: Option<&[i64]>) -> Result<(), PersistenceError> {
        let pending = self.schedules.list_pending(model_ids).await?;
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "processing pending schedules");
        }
        for schedule in pending {
            tracing::debug!(
                schedule_id = schedule.id,
                scheduled_for = schedule.scheduled_for,
                "dispatching schedule"
            );
            self.run_schedule(schedule.id).await?;
        }
        Ok(())
    }

    /// Drive one schedule through the state machine. Re-fetches the row and
    /// no-ops if it is missing or already claimed, so overlapping dispatch
    /// passes stay idempotent.
    async fn run_schedule(&self, id: i64) -> Result<(), PersistenceError> {
        let Some(schedule) = self.schedules.get_schedule(id).await? else {
            return Ok(());
        };
        if schedule.status != MatchStatus::Pending {
            tracing::debug!(schedule_id = id, status = ?schedule.status, "schedule already claimed, skipping");
            return Ok(());
        }

        let model = self.models.get_model(schedule.model_id).await?;
        let Some(model) = model.filter(|m| m.is_active) else {
            tracing::warn!(
                schedule_id = id,
                model_id = schedule.model_id,
                "model missing or inactive, marking schedule failed"
            );
            self.schedules.mark_failed(id).await?;
            return Ok(());
        };

        let game_id = self
            .play
            .games
            .create_game(model.id, OPPONENT_TAG, now_timestamp())
            .await?;
        self.schedules.mark_running(id, game_id).await?;
        tracing::info!(schedule_id = id, game_id, model = %model.name, "match running");

        match play_game(&self.play, game_id, &model).await {
            Ok(_) => {
                self.schedules.mark_completed(id).await?;
                // Re-fetch the game and trust its persisted result
                let Some(game) = self.play.games.get_game(game_id).await? else {
                    return Ok(());
                };
                match game.result {
                    Some(result) if !self.dry_run => {
                        let new_rating = adjust_rating(model.rating, result, STOCKFISH_RATING);
                        self.models
                            .update_rating(model.id, new_rating, now_timestamp())
                            .await?;
                        tracing::info!(
                            model = %model.name,
                            old_rating = model.rating,
                            new_rating,
                            ?result,
                            moves = game.moves_count,
                            "rating updated"
                        );
                    }
                    _ => {
                        self.models
                            .touch_last_active(model.id, now_timestamp())
                            .await?;
                    }
                }
            }
            Err(e) => {
                tracing::error!(schedule_id = id, game_id, "match failed: {e}");
                self.schedules.mark_failed(id).await?;
            }
        }
        Ok(())
    }

    async fn ensure_providers_ready(&self) -> Result<(), SchedulerError> {
        if let Some(client) = self.play.model_client.as_ref() {
            client.start().await?;
        }
        if let Some(engine) = self.play.engine.as_ref() {
            engine.start().await?;
        }
        Ok(())
    }
}

/// Parse model-id filter strings, silently dropping anything non-numeric.
fn coerce_model_ids(ids: &[String]) -> Vec<i64> {
    ids.iter().filter_map(|id| id.trim().parse().ok()).collect()
}
