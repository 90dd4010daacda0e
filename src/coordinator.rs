//! Exchange coordinator — orchestrates one user turn end-to-end.
//!
//! For every submitted, non-empty question the coordinator guarantees the
//! conversation gains exactly two entries: the user turn (appended before
//! the network call so the question is visible during the wait) and then
//! exactly one outcome turn — assistant on success, error on application
//! or transport failure. Failures are always recovered into a renderable
//! entry; nothing here propagates to the caller.
//!
//! Mutual exclusion is owned by the coordinator itself via an internal
//! busy flag, not by the presentation layer disabling its input. A submit
//! racing an in-flight exchange is rejected as [`SubmitOutcome::Busy`]
//! without touching the log. There is no cancellation and no timeout
//! beyond the HTTP client's own: if the transport never resolves, the
//! coordinator stays busy for good. Accepted limitation.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::backend::{BackendError, ChatClient, HistoryPair, Reply};
use crate::conversation::{Conversation, Message, Role};

/// Maximum number of prior dialogue turns sent as context.
pub const HISTORY_WINDOW: usize = 6;

/// Fixed text for transport failures (connect error, timeout, bad body).
pub const CONNECT_ERROR_TEXT: &str =
    "Failed to connect to server. Make sure the Python backend is running on port 8000.";

/// Fallback when the backend refuses without supplying an error message.
pub const GENERIC_ERROR_TEXT: &str = "An error occurred";

/// What a call to [`ExchangeCoordinator::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A full exchange ran; two entries were appended.
    Completed,
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// Another exchange was in flight; nothing happened.
    Busy,
}

/// Coordinator over one conversation and one backend.
///
/// Takes `&self` everywhere so it can be shared behind an `Arc` between
/// the console task and anything else that reads the log. Appends stay
/// strictly serialized regardless: the busy flag admits one exchange at
/// a time and the log itself sits behind a mutex.
pub struct ExchangeCoordinator {
    backend: ChatClient,
    conversation: Mutex<Conversation>,
    busy: AtomicBool,
}

impl ExchangeCoordinator {
    pub fn new(backend: ChatClient) -> Self {
        Self::with_conversation(backend, Conversation::new())
    }

    /// Coordinator over an existing log. The store stays injectable so
    /// callers (and tests) can start from any prior history.
    pub fn with_conversation(backend: ChatClient, conversation: Conversation) -> Self {
        Self {
            backend,
            conversation: Mutex::new(conversation),
            busy: AtomicBool::new(false),
        }
    }

    /// Whether an exchange is currently in flight. The console uses this
    /// for its busy indicator; it is advisory only — `submit` re-checks
    /// atomically.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Number of entries in the log. Cheaper than [`Self::snapshot`] when a
    /// renderer only needs to know whether anything new arrived.
    pub fn len(&self) -> usize {
        self.lock_conversation().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_conversation().is_empty()
    }

    /// Owned copy of the current log, in display order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock_conversation().snapshot().to_vec()
    }

    /// Run one exchange: validate, gate, window, call, append the outcome.
    pub async fn submit(&self, raw_input: &str) -> SubmitOutcome {
        let question = raw_input.trim();
        if question.is_empty() {
            return SubmitOutcome::Ignored;
        }

        // Admit exactly one exchange; released by the guard on every exit
        // path, including cancellation of this future.
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("submit rejected: exchange already in flight");
            return SubmitOutcome::Busy;
        }
        let _gate = BusyGuard(&self.busy);

        // Window over the history as it exists before this turn, then make
        // the user's question visible while the call is pending.
        let history = {
            let mut conv = self.lock_conversation();
            let window = context_window(conv.snapshot());
            conv.append(Message::user(question));
            window
        };

        info!(history_len = history.len(), "exchange started");

        let outcome = match self.backend.ask(question, history).await {
            Ok(Reply::Answer { answer, sources }) => Message::assistant(answer, sources),
            Ok(Reply::Refusal { error }) => {
                Message::error(error.unwrap_or_else(|| GENERIC_ERROR_TEXT.to_string()))
            }
            Err(BackendError::Transport(reason)) => {
                debug!(%reason, "exchange failed at transport level");
                Message::error(CONNECT_ERROR_TEXT)
            }
        };

        self.lock_conversation().append(outcome);
        SubmitOutcome::Completed
    }

    fn lock_conversation(&self) -> std::sync::MutexGuard<'_, Conversation> {
        // A poisoned lock only means a reader panicked mid-snapshot; the
        // append-only log is still coherent.
        self.conversation
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Clears the busy flag when dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Build the outgoing context window from prior history.
///
/// Keeps `user`/`assistant` turns only, takes the most recent
/// [`HISTORY_WINDOW`] of them in original order, and maps each to a
/// `{question, answer}` pair with the other side empty. Pairs empty on
/// both sides are dropped — cannot occur after the role filter, but the
/// contract states the filter explicitly.
pub fn context_window(history: &[Message]) -> Vec<HistoryPair> {
    let dialogue: Vec<&Message> = history
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .collect();
    let start = dialogue.len().saturating_sub(HISTORY_WINDOW);

    dialogue[start..]
        .iter()
        .map(|m| match m.role {
            Role::User => HistoryPair { question: m.content.clone(), answer: String::new() },
            _ => HistoryPair { question: String::new(), answer: m.content.clone() },
        })
        .filter(|p| !p.question.is_empty() || !p.answer.is_empty())
        .collect()
}
