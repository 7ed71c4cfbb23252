//! Configuration for the chessbench arena.
//!
//! All settings come from `CHESSBENCH_*` environment variables with
//! documented defaults, so the binary runs with no configuration at all
//! against a local `stockfish` install and an unauthenticated endpoint.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATABASE_PATH: &str = "./data/chessbench.db";
const DEFAULT_PGN_DIR: &str = "./data/pgn";
const DEFAULT_API_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_ENGINE_PATH: &str = "stockfish";
const DEFAULT_ENGINE_SKILL_LEVEL: u8 = 20;
const DEFAULT_ENGINE_MOVETIME_MS: u64 = 500;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_POLL_INTERVAL_SECS: f64 = 5.0;

/// Runtime settings, resolved once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database file (`CHESSBENCH_DATABASE_PATH`).
    pub database_path: PathBuf,
    /// Directory for PGN transcripts (`CHESSBENCH_PGN_DIR`).
    pub pgn_dir: PathBuf,
    /// Chat-completion endpoint base URL (`CHESSBENCH_API_BASE_URL`).
    pub api_base_url: String,
    /// Bearer token for the endpoint (`CHESSBENCH_API_KEY`), optional.
    pub api_key: Option<String>,
    /// HTTP timeout for completion requests (`CHESSBENCH_HTTP_TIMEOUT_SECS`).
    pub http_timeout: Duration,
    /// Engine binary path or name (`CHESSBENCH_ENGINE_PATH`).
    pub engine_path: String,
    /// UCI skill level applied at engine startup
    /// (`CHESSBENCH_ENGINE_SKILL_LEVEL`).
    pub engine_skill_level: u8,
    /// Engine search budget per move (`CHESSBENCH_ENGINE_MOVETIME_MS`).
    pub engine_movetime_ms: u64,
    /// Background poll interval (`CHESSBENCH_POLL_INTERVAL_SECS`).
    pub poll_interval: Duration,
}

impl Settings {
    /// Resolve settings from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            database_path: PathBuf::from(
                env_or("CHESSBENCH_DATABASE_PATH", DEFAULT_DATABASE_PATH),
            ),
            pgn_dir: PathBuf::from(env_or("CHESSBENCH_PGN_DIR", DEFAULT_PGN_DIR)),
            api_base_url: env_or("CHESSBENCH_API_BASE_URL", DEFAULT_API_BASE_URL),
            api_key: std::env::var("CHESSBENCH_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            http_timeout: Duration::from_secs(parsed_env_or(
                "CHESSBENCH_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            engine_path: env_or("CHESSBENCH_ENGINE_PATH", DEFAULT_ENGINE_PATH),
            engine_skill_level: parsed_env_or(
                "CHESSBENCH_ENGINE_SKILL_LEVEL",
                DEFAULT_ENGINE_SKILL_LEVEL,
            ),
            engine_movetime_ms: parsed_env_or(
                "CHESSBENCH_ENGINE_MOVETIME_MS",
                DEFAULT_ENGINE_MOVETIME_MS,
            ),
            poll_interval: Duration::from_secs_f64(parsed_env_or(
                "CHESSBENCH_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: tests only cover the default path to avoid environment-variable
    // pollution between tests; overrides are exercised manually.

    #[test]
    fn test_defaults() {
        let settings = Settings::from_env();
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(settings.engine_path, DEFAULT_ENGINE_PATH);
        assert_eq!(settings.engine_skill_level, 20);
        assert_eq!(settings.engine_movetime_ms, 500);
        assert_eq!(settings.http_timeout, Duration::from_secs(20));
        assert_eq!(settings.poll_interval, Duration::from_secs(5));
    }
}
