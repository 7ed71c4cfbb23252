//! UCI engine subprocess move provider.
//!
//! Owns one long-lived engine process. A spawned reader task parses engine
//! stdout into [`UciMessage`] events; commands are written directly to the
//! process stdin under the provider's ordering lock, so at most one search
//! is in flight at a time.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use cozy_chess::Move;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::{mpsc, Mutex};

use crate::uci::{parse_uci_message, UciMessage};
use crate::EngineError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const SEARCH_GRACE: Duration = Duration::from_secs(10);
const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for the engine subprocess.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit path to the engine binary, or a bare name resolved via PATH.
    pub binary_path: String,
    /// UCI `Skill Level` applied at startup.
    pub skill_level: u8,
    /// Search budget per move, in milliseconds.
    pub movetime_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary_path: "stockfish".to_string(),
            skill_level: 20,
            movetime_ms: 500,
        }
    }
}

/// Move provider backed by a UCI engine subprocess.
pub struct EngineProvider {
    config: EngineConfig,
    process: Mutex<Option<EngineProcess>>,
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    events: mpsc::Receiver<UciMessage>,
}

impl EngineProcess {
    async fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        tracing::trace!("UCI >> {}", line);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }
}

impl EngineProvider {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            process: Mutex::new(None),
        }
    }

    /// Check that the engine binary resolves without starting the process.
    pub fn validate(&self) -> Result<(), EngineError> {
        resolve_binary(&self.config.binary_path).map(|_| ())
    }

    pub async fn is_started(&self) -> bool {
        self.process.lock().await.is_some()
    }

    /// Spawn the engine, perform the UCI handshake, and apply the configured
    /// skill level. Idempotent.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut guard = self.process.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let path = resolve_binary(&self.config.binary_path)?;
        tracing::info!(
            path = %path.display(),
            skill_level = self.config.skill_level,
            "starting engine"
        );

        let mut child = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout unavailable".to_string()))?;

        let (event_tx, events) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::debug!("engine stdout closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        tracing::trace!("UCI << {}", trimmed);
                        match parse_uci_message(trimmed) {
                            Ok(msg) => {
                                if event_tx.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            Err(_) => tracing::trace!("ignoring UCI line: {}", trimmed),
                        }
                    }
                    Err(e) => {
                        tracing::error!("error reading engine stdout: {}", e);
                        break;
                    }
                }
            }
        });

        let mut process = EngineProcess {
            child,
            stdin,
            events,
        };

        process.send_line("uci").await?;
        wait_for(&mut process.events, HANDSHAKE_TIMEOUT, |msg| {
            matches!(msg, UciMessage::UciOk)
        })
        .await?;

        process
            .send_line(&format!(
                "setoption name Skill Level value {}",
                self.config.skill_level
            ))
            .await?;
        process.send_line("isready").await?;
        wait_for(&mut process.events, HANDSHAKE_TIMEOUT, |msg| {
            matches!(msg, UciMessage::ReadyOk)
        })
        .await?;

        *guard = Some(process);
        tracing::info!("engine started");
        Ok(())
    }

    /// Run a fixed-time search from the given position and return the
    /// engine's selected move.
    ///
    /// Serialized by the provider lock: one engine process handles one
    /// search at a time.
    pub async fn choose_move(&self, fen: &str) -> Result<Move, EngineError> {
        let mut guard = self.process.lock().await;
        let process = guard.as_mut().ok_or(EngineError::NotStarted)?;

        tracing::debug!(fen, movetime_ms = self.config.movetime_ms, "requesting engine move");
        process.send_line(&format!("position fen {}", fen)).await?;
        process
            .send_line(&format!("go movetime {}", self.config.movetime_ms))
            .await?;

        let deadline = Duration::from_millis(self.config.movetime_ms) + SEARCH_GRACE;
        let best = tokio::time::timeout(deadline, async {
            while let Some(msg) = process.events.recv().await {
                if let UciMessage::BestMove(mv) = msg {
                    return Ok(mv);
                }
            }
            Err(EngineError::Closed)
        })
        .await
        .map_err(|_| EngineError::Timeout)??;

        best.ok_or_else(|| EngineError::Protocol("engine returned no move".to_string()))
    }

    /// Terminate the engine process. Idempotent; best-effort graceful quit
    /// followed by a kill.
    pub async fn stop(&self) {
        let mut guard = self.process.lock().await;
        let Some(mut process) = guard.take() else {
            return;
        };
        tracing::info!("stopping engine");
        let _ = process.send_line("quit").await;
        if tokio::time::timeout(QUIT_TIMEOUT, process.child.wait())
            .await
            .is_err()
        {
            let _ = process.child.kill().await;
        }
    }
}

async fn wait_for(
    events: &mut mpsc::Receiver<UciMessage>,
    timeout: Duration,
    mut want: impl FnMut(&UciMessage) -> bool,
) -> Result<(), EngineError> {
    tokio::time::timeout(timeout, async {
        while let Some(msg) = events.recv().await {
            if want(&msg) {
                return Ok(());
            }
        }
        Err(EngineError::Closed)
    })
    .await
    .map_err(|_| EngineError::Timeout)?
}

/// Resolve the engine binary: an explicit path that exists wins, otherwise
/// bare names are searched on PATH.
fn resolve_binary(binary: &str) -> Result<PathBuf, EngineError> {
    let explicit = Path::new(binary);
    if explicit.is_file() {
        return Ok(explicit.to_path_buf());
    }
    if !binary.contains(std::path::MAIN_SEPARATOR) {
        if let Some(paths) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&paths) {
                let candidate = dir.join(binary);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
    }
    Err(EngineError::Unavailable(binary.to_string()))
}
