//! Chat-completion client for language-model move selection.
//!
//! [`ModelClient`] talks to an OpenRouter-compatible endpoint and turns
//! free-form model replies into legal SAN moves via [`extract_move`],
//! retrying with a corrective prompt when the reply contains no legal move.

pub mod client;
pub mod error;
pub mod extract;

pub use client::{ModelClient, ModelConfig};
pub use error::{ClientResult, ModelClientError};
pub use extract::extract_move;
