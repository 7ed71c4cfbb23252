//! The per-game play loop.
//!
//! Plays one full game to completion, alternating between the model and
//! engine move providers (or a scripted queue / deterministic fallback in
//! dry-run mode), recording each ply and finalizing the game row plus its
//! PGN transcript.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use cozy_chess::{Color, Move};
use tokio::sync::Mutex;

use chess::uci::{convert_uci_castling, parse_uci_move};
use chess::{parse_san, GameOutcome, MatchGame};
use engine::EngineProvider;
use model_client::{ModelClient, ModelConfig};

use crate::persistence::{
    now_timestamp, GameCompletion, GameRepository, GameResult, ModelRecord, MoveRepository,
    MoveSide, Persistence, PersistenceError,
};
use crate::pgn::{self, PgnHeaders};

/// Hard cap on game length in half-moves, a safety valve against runaway
/// games.
pub const MAX_HALF_MOVES: usize = 400;

const OPENING_PREFIX_PLIES: usize = 6;
const MATCH_EVENT: &str = "Chessbench Daily Match";
const ENGINE_PLAYER_NAME: &str = "Stockfish";

#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error("model move selection failed: {0}")]
    Model(#[from] model_client::ModelClientError),
    #[error("engine move selection failed: {0}")]
    Engine(#[from] engine::EngineError),
    #[error("model move has no legal interpretation: {0}")]
    IllegalSan(String),
    #[error(transparent)]
    Rules(#[from] chess::MatchGameError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("failed to write transcript: {0}")]
    Transcript(#[from] std::io::Error),
}

/// Everything the play loop needs besides the game id itself.
pub struct PlayContext<D: Persistence> {
    pub games: Arc<D::Games>,
    pub moves: Arc<D::Moves>,
    pub engine: Option<Arc<EngineProvider>>,
    pub model_client: Option<Arc<ModelClient>>,
    /// Scripted UCI moves, shared across games and consumed front-first.
    pub scripted: Mutex<VecDeque<String>>,
    /// Set when a scripted queue was configured. In this mode a drained
    /// queue ends the game instead of falling through to providers.
    pub scripted_mode: bool,
    pub dry_run: bool,
    pub pgn_dir: PathBuf,
}

enum ScriptedMove {
    Play(Move),
    Fallback,
    Exhausted,
}

/// Play one game to completion and return the result from the model's
/// perspective. The model plays White.
pub async fn play_game<D: Persistence>(
    ctx: &PlayContext<D>,
    game_id: i64,
    model: &ModelRecord,
) -> Result<GameResult, PlayError> {
    let model_is_white = true;
    let mut game = MatchGame::new();
    let date = chrono::Utc::now().format("%Y.%m.%d").to_string();

    tracing::info!(game_id, model = %model.name, "game starting");

    while game.outcome().is_none() && game.ply_count() < MAX_HALF_MOVES {
        let side_to_move = game.side_to_move();
        let model_turn = (side_to_move == Color::White) == model_is_white;

        let mv = if ctx.scripted_mode {
            match next_scripted_move(ctx, &game).await {
                ScriptedMove::Play(mv) => mv,
                ScriptedMove::Fallback => fallback_move(&game)?,
                ScriptedMove::Exhausted => {
                    tracing::debug!(game_id, "scripted moves exhausted, ending game");
                    break;
                }
            }
        } else if model_turn {
            choose_model_move(ctx, &game, model).await?
        } else {
            choose_engine_move(ctx, &game).await?
        };

        let ply = (game.ply_count() + 1) as i64;
        let side = match side_to_move {
            Color::White => MoveSide::White,
            Color::Black => MoveSide::Black,
        };
        let san = game.make_move(mv)?;
        tracing::debug!(game_id, ply, side = ?side, san = %san, "move played");
        ctx.moves
            .insert_move(game_id, ply, side, &san, now_timestamp())
            .await?;
    }

    let result = match game.outcome() {
        Some(GameOutcome::WhiteWins) => {
            if model_is_white {
                GameResult::Win
            } else {
                GameResult::Loss
            }
        }
        Some(GameOutcome::BlackWins) => {
            if model_is_white {
                GameResult::Loss
            } else {
                GameResult::Win
            }
        }
        Some(GameOutcome::Draw(_)) | None => GameResult::Draw,
    };

    let san_history = game.san_history().to_vec();
    let opening = if san_history.is_empty() {
        None
    } else {
        let prefix = san_history.len().min(OPENING_PREFIX_PLIES);
        Some(san_history[..prefix].join(" "))
    };

    let headers = PgnHeaders {
        event: MATCH_EVENT.to_string(),
        date,
        white: if model_is_white {
            model.name.clone()
        } else {
            ENGINE_PLAYER_NAME.to_string()
        },
        black: if model_is_white {
            ENGINE_PLAYER_NAME.to_string()
        } else {
            model.name.clone()
        },
        result: pgn::result_code(result).to_string(),
    };
    let transcript = pgn::render(&headers, &san_history);
    let pgn_path = pgn::write_game(&ctx.pgn_dir, game_id, &transcript)?;

    ctx.games
        .finalize_game(
            game_id,
            &GameCompletion {
                completed_at: now_timestamp(),
                result,
                moves_count: san_history.len() as i64,
                opening,
                pgn_path: Some(pgn_path.display().to_string()),
            },
        )
        .await?;

    tracing::info!(
        game_id,
        ?result,
        moves = san_history.len(),
        outcome = ?game.outcome(),
        "game finished"
    );
    Ok(result)
}

/// Pop the next scripted entry. Entries that do not parse to a legal move
/// in the current position are consumed and discarded.
async fn next_scripted_move<D: Persistence>(
    ctx: &PlayContext<D>,
    game: &MatchGame,
) -> ScriptedMove {
    let raw = match ctx.scripted.lock().await.pop_front() {
        Some(raw) => raw,
        None => return ScriptedMove::Exhausted,
    };

    let parsed = match parse_uci_move(&raw) {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(raw = %raw, "scripted move does not parse, substituting fallback");
            return ScriptedMove::Fallback;
        }
    };

    let legal = game.legal_moves();
    let mv = convert_uci_castling(parsed, &legal);
    if legal.contains(&mv) {
        ScriptedMove::Play(mv)
    } else {
        tracing::warn!(raw = %raw, "scripted move is illegal here, substituting fallback");
        ScriptedMove::Fallback
    }
}

async fn choose_model_move<D: Persistence>(
    ctx: &PlayContext<D>,
    game: &MatchGame,
    model: &ModelRecord,
) -> Result<Move, PlayError> {
    if ctx.dry_run {
        return fallback_move(game);
    }
    let Some(client) = ctx.model_client.as_ref() else {
        return fallback_move(game);
    };

    let legal_san = game.legal_moves_san();
    let config = ModelConfig::new(model.llm_model.as_str());
    let san = client
        .choose_move(&game.to_fen(), game.san_history(), &legal_san, &config)
        .await?;
    parse_san(game.position(), &san).map_err(|_| PlayError::IllegalSan(san))
}

async fn choose_engine_move<D: Persistence>(
    ctx: &PlayContext<D>,
    game: &MatchGame,
) -> Result<Move, PlayError> {
    if ctx.dry_run {
        return fallback_move(game);
    }
    let Some(engine) = ctx.engine.as_ref() else {
        return fallback_move(game);
    };

    let mv = engine.choose_move(&game.to_fen()).await?;
    // An illegal engine move is caught by make_move and fails the game
    Ok(convert_uci_castling(mv, &game.legal_moves()))
}

/// Deterministic placeholder when no provider applies: the first legal
/// move in the generator's default ordering. Never random.
fn fallback_move(game: &MatchGame) -> Result<Move, PlayError> {
    game.legal_moves().first().copied().ok_or_else(|| {
        PlayError::Rules(chess::MatchGameError::IllegalMove(
            "no legal moves available".to_string(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::{
        Database, SqliteGameRepository, SqliteModelRepository, SqliteMoveRepository,
        SqlitePersistence,
    };
    use crate::persistence::ModelRepository;

    struct Fixture {
        _db: Database,
        ctx: PlayContext<SqlitePersistence>,
        model: ModelRecord,
        game_id: i64,
        _tmp: tempfile::TempDir,
    }

    async fn fixture(scripted: Vec<&str>) -> Fixture {
        let db = Database::new_in_memory().await.unwrap();
        let tmp = tempfile::tempdir().unwrap();

        let models = SqliteModelRepository::new(db.pool().clone());
        let model_id = models.create_model("Test Model", "test/model").await.unwrap();
        let model = models.get_model(model_id).await.unwrap().unwrap();

        let games = Arc::new(SqliteGameRepository::new(db.pool().clone()));
        let game_id = games
            .create_game(model_id, "stockfish", now_timestamp())
            .await
            .unwrap();

        let scripted_mode = !scripted.is_empty();
        let ctx = PlayContext::<SqlitePersistence> {
            games,
            moves: Arc::new(SqliteMoveRepository::new(db.pool().clone())),
            engine: None,
            model_client: None,
            scripted: Mutex::new(scripted.into_iter().map(String::from).collect()),
            scripted_mode,
            dry_run: true,
            pgn_dir: tmp.path().to_path_buf(),
        };

        Fixture {
            _db: db,
            ctx,
            model,
            game_id,
            _tmp: tmp,
        }
    }

    #[tokio::test]
    async fn test_scripted_game_records_exactly_the_script() {
        let fx = fixture(vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]).await;
        let result = play_game(&fx.ctx, fx.game_id, &fx.model).await.unwrap();
        assert_eq!(result, GameResult::Draw);

        let moves = fx.ctx.moves.list_moves(fx.game_id).await.unwrap();
        let sans: Vec<&str> = moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6"]);

        let game = fx.ctx.games.get_game(fx.game_id).await.unwrap().unwrap();
        assert_eq!(game.result, Some(GameResult::Draw));
        assert_eq!(game.moves_count, 6);
        assert_eq!(game.opening.as_deref(), Some("e4 e5 Nf3 Nc6 Bc4 Nf6"));

        let pgn_path = game.pgn_path.unwrap();
        let transcript = std::fs::read_to_string(&pgn_path).unwrap();
        assert!(transcript.contains("1. e4 e5 2. Nf3 Nc6 3. Bc4 Nf6 1/2-1/2"));
        assert!(transcript.contains("[White \"Test Model\"]"));
    }

    #[tokio::test]
    async fn test_dry_run_fallback_game_terminates_within_cap() {
        let fx = fixture(vec![]).await;
        let result = play_game(&fx.ctx, fx.game_id, &fx.model).await.unwrap();
        assert!(matches!(
            result,
            GameResult::Win | GameResult::Loss | GameResult::Draw
        ));

        let game = fx.ctx.games.get_game(fx.game_id).await.unwrap().unwrap();
        assert!(game.moves_count >= 1);
        assert!(game.moves_count <= MAX_HALF_MOVES as i64);
        assert!(game.completed_at.is_some());

        let moves = fx.ctx.moves.list_moves(fx.game_id).await.unwrap();
        assert_eq!(moves.len() as i64, game.moves_count);
    }

    #[tokio::test]
    async fn test_scripted_illegal_entry_substitutes_fallback() {
        // "e7e5" is not legal for White on the first ply; the entry is
        // consumed and a deterministic fallback move is played instead.
        let fx = fixture(vec!["e7e5", "e7e5"]).await;
        let result = play_game(&fx.ctx, fx.game_id, &fx.model).await.unwrap();
        assert_eq!(result, GameResult::Draw);

        let moves = fx.ctx.moves.list_moves(fx.game_id).await.unwrap();
        assert_eq!(moves.len(), 2);
        // Second entry is legal once it is Black's turn
        assert_eq!(moves[1].san, "e5");
    }

    #[tokio::test]
    async fn test_opening_prefix_limited_to_six_tokens() {
        let fx = fixture(vec![
            "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "b1c3", "f8c5",
        ])
        .await;
        play_game(&fx.ctx, fx.game_id, &fx.model).await.unwrap();

        let game = fx.ctx.games.get_game(fx.game_id).await.unwrap().unwrap();
        assert_eq!(game.moves_count, 8);
        assert_eq!(game.opening.as_deref(), Some("e4 e5 Nf3 Nc6 Bc4 Nf6"));
    }
}
