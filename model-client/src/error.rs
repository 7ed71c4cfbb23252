//! Error types for the model client

use thiserror::Error;

pub type ClientResult<T> = Result<T, ModelClientError>;

#[derive(Error, Debug)]
pub enum ModelClientError {
    #[error("model client not started")]
    NotStarted,

    #[error("no legal moves available for the current position")]
    NoLegalMoves,

    #[error("model failed to supply a legal move after {attempts} attempts")]
    IllegalMove { attempts: u32 },

    #[error("chat completion request failed: {0}")]
    Http(#[from] reqwest::Error),
}
