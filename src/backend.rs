//! HTTP client for the RAG backend (`POST /api/chat`).
//!
//! All wire types are private to this module — callers see only
//! [`Reply`] and [`BackendError`]. The backend signals logical failure
//! in-band (`success: false`), so a response is parsed defensively into
//! a tagged variant at this boundary rather than handed upward as a
//! bag of optional fields. One round trip per call; retries and history
//! management belong to the exchange coordinator.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::conversation::Source;

#[derive(Debug, Error)]
pub enum BackendError {
    /// The call itself failed: connect error, timeout, or a body that is
    /// not the expected JSON shape.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// One `{question, answer}` pair of prior dialogue sent as context.
/// Exactly one side is non-empty for any real turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPair {
    pub question: String,
    pub answer: String,
}

/// Outcome of a successfully-parsed backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `success: true` — an answer, with whatever citations came along.
    Answer { answer: String, sources: Vec<Source> },
    /// `success: false` — the backend declined; `error` may be absent.
    Refusal { error: Option<String> },
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Client for one backend origin.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    chat_url: String,
    health_url: String,
}

impl ChatClient {
    /// Build a client for `base_url` (origin, no trailing slash) with a
    /// per-request timeout.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            chat_url: format!("{base_url}/api/chat"),
            health_url: format!("{base_url}/health"),
        })
    }

    /// Lightweight reachability probe against the backend's health route.
    ///
    /// Any HTTP response (including 4xx) means the server is reachable.
    /// Only a transport-level failure (connection refused, timeout) is
    /// treated as unreachable. Uses a hard 5-second timeout regardless of
    /// the configured request timeout.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build ping client: {e}")))?;
        client
            .get(&self.health_url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Transport(format!("unreachable: {e}")))
    }

    /// Send one question plus its context window and parse the reply.
    ///
    /// A non-2xx status is not special-cased: like the reply body of a 2xx,
    /// it either parses into the expected shape (and the `success` flag
    /// decides) or it is a transport failure.
    pub async fn ask(
        &self,
        question: &str,
        conversation_history: Vec<HistoryPair>,
    ) -> Result<Reply, BackendError> {
        let payload = ChatRequest {
            question: question.to_string(),
            conversation_history,
        };

        debug!(
            question_len = payload.question.len(),
            history_len = payload.conversation_history.len(),
            "sending chat request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full chat request payload");
        }

        let response = self
            .client
            .post(&self.chat_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.chat_url, error = %e, "chat request failed (transport)");
                BackendError::Transport(e.to_string())
            })?;

        let status = response.status();
        let parsed = response.json::<ChatResponse>().await.map_err(|e| {
            error!(%status, error = %e, "failed to deserialize chat response");
            BackendError::Transport(format!("failed to parse response body: {e}"))
        })?;

        if parsed.success {
            // A missing answer on success is tolerated as an empty one, the
            // same way the reference frontend renders it.
            if parsed.answer.is_none() {
                warn!("backend reported success without an answer field");
            }
            let sources = parsed
                .sources
                .unwrap_or_default()
                .into_iter()
                .map(|s| Source { document_name: s.document_name, similarity: s.similarity })
                .collect();
            Ok(Reply::Answer {
                answer: parsed.answer.unwrap_or_default(),
                sources,
            })
        } else {
            debug!(error = ?parsed.error, "backend refused the question");
            Ok(Reply::Refusal { error: parsed.error })
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    question: String,
    conversation_history: Vec<HistoryPair>,
}

/// Response envelope. `chunk_text` on sources and the top-level `timestamp`
/// are sent by the backend but unused here; serde drops them silently.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    success: bool,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    sources: Option<Vec<SourceChunk>>,
}

#[derive(Debug, Deserialize)]
struct SourceChunk {
    document_name: String,
    similarity: f64,
}
