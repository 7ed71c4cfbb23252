//! Chessbench arena: automated chess matches between language models and a
//! UCI engine, with Elo tracking.

mod config;
mod persistence;
mod pgn;
mod play;
mod ratings;
mod scheduler;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use engine::{EngineConfig, EngineProvider};
use model_client::ModelClient;

use config::Settings;
use persistence::{
    Database, SqliteGameRepository, SqliteModelRepository, SqliteMoveRepository,
    SqlitePersistence, SqliteScheduleRepository,
};
use scheduler::{MatchScheduler, SchedulerConfig};

/// Top-level CLI arguments.
#[derive(Parser)]
#[command(name = "chessbench-arena", about = "Automated LLM vs engine chess matches")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed schedules for active models and play them in one pass.
    RunGames {
        /// Restrict to specific model ids (repeatable).
        #[arg(long = "model-id")]
        model_ids: Vec<String>,

        /// Use scripted/fallback moves and skip rating updates.
        #[arg(long)]
        dry_run: bool,

        /// Scripted UCI moves for dry-run scenarios (repeatable).
        #[arg(long = "scripted-move")]
        scripted_moves: Vec<String>,
    },

    /// Run the background scheduler until interrupted.
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    tracing::info!(database = %settings.database_path.display(), "opening database");
    let db = Database::open(&settings.database_path).await?;

    match cli.command {
        Commands::RunGames {
            model_ids,
            dry_run,
            scripted_moves,
        } => {
            let scheduler = build_scheduler(&db, &settings, dry_run, scripted_moves)?;
            let ids = if model_ids.is_empty() {
                None
            } else {
                Some(model_ids)
            };

            let seed_filter: Option<Vec<i64>> = ids.as_deref().map(|ids| {
                ids.iter()
                    .filter_map(|id| id.trim().parse().ok())
                    .collect()
            });
            scheduler
                .seed_schedules(seed_filter.as_deref().filter(|f| !f.is_empty()))
                .await?;

            let result = scheduler.run_once(ids.as_deref()).await;
            scheduler.stop().await;
            result?;
        }

        Commands::Watch => {
            let scheduler = build_scheduler(&db, &settings, false, Vec::new())?;
            scheduler.start().await?;
            tracing::info!("scheduler running, press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down");
            scheduler.stop().await;
        }
    }

    Ok(())
}

fn build_scheduler(
    db: &Database,
    settings: &Settings,
    dry_run: bool,
    scripted_moves: Vec<String>,
) -> anyhow::Result<Arc<MatchScheduler<SqlitePersistence>>> {
    let engine = if dry_run {
        None
    } else {
        let provider = EngineProvider::new(EngineConfig {
            binary_path: settings.engine_path.clone(),
            skill_level: settings.engine_skill_level,
            movetime_ms: settings.engine_movetime_ms,
        });
        provider.validate()?;
        Some(Arc::new(provider))
    };

    let model_client = if dry_run {
        None
    } else {
        Some(Arc::new(ModelClient::new(
            &settings.api_base_url,
            settings.api_key.clone(),
            settings.http_timeout,
        )))
    };

    let scheduler = MatchScheduler::new(
        Arc::new(SqliteModelRepository::new(db.pool().clone())),
        Arc::new(SqliteScheduleRepository::new(db.pool().clone())),
        Arc::new(SqliteGameRepository::new(db.pool().clone())),
        Arc::new(SqliteMoveRepository::new(db.pool().clone())),
        engine,
        model_client,
        SchedulerConfig {
            poll_interval: settings.poll_interval,
            dry_run,
            scripted_moves,
            pgn_dir: settings.pgn_dir.clone(),
        },
    )?;

    Ok(Arc::new(scheduler))
}
