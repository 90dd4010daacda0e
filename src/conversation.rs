//! Conversation store — the append-only log of dialogue turns.
//!
//! The store is the single source of truth for what the console renders.
//! It exposes exactly two operations: [`Conversation::append`] for the
//! exchange coordinator and [`Conversation::snapshot`] for readers. No
//! entry is ever mutated or removed for the life of the session, and
//! nothing is persisted — the log dies with the process.

use serde::{Deserialize, Serialize};

/// Who produced a turn. Error turns are rendered but never count as
/// dialogue context when building a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

/// A citation attached to an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Title of the referenced document.
    pub document_name: String,
    /// Relevance score in [0, 1]; the console renders it as a percentage.
    pub similarity: f64,
}

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Cited material; empty on every non-assistant turn.
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), sources: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self { role: Role::Assistant, content: content.into(), sources }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self { role: Role::Error, content: content.into(), sources: Vec::new() }
    }
}

/// Ordered sequence of turns, insertion order significant.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn to the end of the log. Accepts any well-formed message
    /// and always succeeds.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Read-only view of the full log, in display order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
