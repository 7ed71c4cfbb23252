//! OpenRouter-compatible chat-completion client.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{ClientResult, ModelClientError};
use crate::extract::extract_move;

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 32;

/// Per-request model parameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatMessageBody,
}

#[derive(Default, Deserialize)]
struct ChatMessageBody {
    #[serde(default)]
    content: String,
}

/// HTTP client for language-model move selection.
///
/// All calls through one instance are serialized by an ordering lock, so a
/// conversational retry sequence is never interleaved with another request.
pub struct ModelClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: Mutex<Option<reqwest::Client>>,
}

impl ModelClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            client: Mutex::new(None),
        }
    }

    /// Build the underlying HTTP client. Idempotent.
    pub async fn start(&self) -> ClientResult<()> {
        let mut guard = self.client.lock().await;
        if guard.is_none() {
            *guard = Some(reqwest::Client::builder().timeout(self.timeout).build()?);
        }
        Ok(())
    }

    /// Drop the underlying HTTP client. Idempotent.
    pub async fn close(&self) {
        self.client.lock().await.take();
    }

    pub async fn is_started(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Ask the model for the next move.
    ///
    /// The reply must resolve to a member of `legal_moves` (via
    /// [`extract_move`]); otherwise the assistant reply plus a corrective
    /// prompt are appended to the conversation and the request is retried,
    /// up to 3 attempts in total. Network and HTTP-status failures are
    /// propagated unchanged and never retried here.
    pub async fn choose_move(
        &self,
        board_fen: &str,
        san_history: &[String],
        legal_moves: &[String],
        config: &ModelConfig,
    ) -> ClientResult<String> {
        if legal_moves.is_empty() {
            return Err(ModelClientError::NoLegalMoves);
        }

        let normalized: Vec<String> = legal_moves
            .iter()
            .map(|mv| mv.trim().replace('0', "O"))
            .filter(|mv| !mv.is_empty())
            .collect();
        let legal_set: HashSet<String> = normalized.iter().cloned().collect();

        let mut messages = vec![
            ChatMessage {
                role: "system",
                content: "You are a chess engine that must obey instructions exactly."
                    .to_string(),
            },
            ChatMessage {
                role: "user",
                content: format_prompt(board_fen, san_history, &normalized),
            },
        ];

        // The lock is held across the whole conversation: one in-flight
        // request per client, and retries stay coherent.
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or(ModelClientError::NotStarted)?;

        for attempt in 1..=MAX_ATTEMPTS {
            let request = ChatRequest {
                model: &config.name,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                messages: &messages,
            };

            let mut builder = client
                .post(format!("{}/chat/completions", self.base_url))
                .json(&request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }

            let response = builder.send().await?.error_for_status()?;
            let body: ChatResponse = response.json().await?;
            let content = body
                .choices
                .first()
                .map(|choice| choice.message.content.trim().to_string())
                .unwrap_or_default();

            tracing::debug!(model = %config.name, attempt, reply = %content, "model reply");

            if let Some(san) = extract_move(&content, &legal_set) {
                return Ok(san);
            }

            tracing::warn!(
                model = %config.name,
                attempt,
                "reply contained no legal move, retrying"
            );
            messages.push(ChatMessage {
                role: "assistant",
                content,
            });
            messages.push(ChatMessage {
                role: "user",
                content: format_retry_prompt(&normalized),
            });
        }

        Err(ModelClientError::IllegalMove {
            attempts: MAX_ATTEMPTS,
        })
    }
}

fn format_prompt(board_fen: &str, san_history: &[String], legal_moves: &[String]) -> String {
    let history = if san_history.is_empty() {
        "(none)".to_string()
    } else {
        san_history.join(" ")
    };
    format!(
        "You are to choose the next legal chess move in Standard Algebraic Notation.\n\
         Current board FEN: {}\n\
         Moves so far: {}\n\
         Legal moves (SAN): {}\n\
         Reply with exactly one line in the format `MOVE: <SAN>` where <SAN> is a string \
         from the legal moves list. Do not include commentary or any other text.",
        board_fen,
        history,
        legal_moves.join(", ")
    )
}

fn format_retry_prompt(legal_moves: &[String]) -> String {
    format!(
        "Your previous reply did not contain exactly one legal SAN move from the list. \
         Respond again using the format `MOVE: <SAN>` choosing one move from this list only: {}.",
        legal_moves.join(", ")
    )
}
