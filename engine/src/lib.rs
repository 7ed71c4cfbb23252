pub mod provider;
pub mod uci;

pub use provider::{EngineConfig, EngineProvider};
pub use uci::{parse_uci_message, UciMessage, UciParseError};

/// Errors from the engine subprocess provider.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine binary not found: {0}")]
    Unavailable(String),

    #[error("engine not started")]
    NotStarted,

    #[error("failed to spawn engine process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected engine reply: {0}")]
    Protocol(String),

    #[error("timed out waiting for engine")]
    Timeout,

    #[error("engine closed unexpectedly")]
    Closed,
}
