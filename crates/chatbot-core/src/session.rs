//! Chat session controller
//!
//! [`ChatSession::submit`] performs the synchronous half of a turn on the
//! caller's [`SessionState`] and hands back a [`PendingReply`] for the network
//! half. Settling that reply is the only way the turn's assistant message gets
//! appended, so each accepted submit produces exactly one user and one
//! assistant entry.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::ai::CompletionBackend;
use crate::error::{ChatError, CompletionError};
use crate::state::{Message, Reply, SessionState};

/// Owns the completion backend. Holds no conversation state of its own.
#[derive(Clone)]
pub struct ChatSession {
    backend: Arc<dyn CompletionBackend>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Start a turn with `text`.
    ///
    /// Whitespace-only input records [`ChatError::EmptyInput`] in
    /// `state.last_error()` and does nothing else. A submit while the state is
    /// busy is refused with [`ChatError::Busy`] and leaves the state as it was.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, state: &mut SessionState, text: &str) -> Result<PendingReply, ChatError> {
        if state.is_busy() {
            tracing::warn!("submit refused: request already in flight");
            return Err(ChatError::Busy);
        }

        let text = text.trim();
        if text.is_empty() {
            state.reject(&ChatError::EmptyInput);
            return Err(ChatError::EmptyInput);
        }

        state.begin(text);
        tracing::info!(chars = text.chars().count(), "submitting prompt");

        let backend = Arc::clone(&self.backend);
        let prompt = text.to_string();
        let handle = tokio::spawn(async move { backend.complete(&prompt).await });

        Ok(PendingReply { handle })
    }
}

/// An in-flight completion. Settle it to finish the turn.
#[must_use = "a pending reply must be settled to append the assistant message"]
#[derive(Debug)]
pub struct PendingReply {
    handle: JoinHandle<Reply>,
}

impl PendingReply {
    /// True once the request has finished and `settle` will not wait.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the request and append its outcome. Returns the appended
    /// assistant message.
    pub async fn settle(self, state: &mut SessionState) -> &Message {
        let reply = match self.handle.await {
            Ok(reply) => reply,
            Err(join_err) => Err(CompletionError::Aborted(join_err.to_string())),
        };

        match &reply {
            Ok(Some(_)) => tracing::info!("reply settled"),
            Ok(None) => tracing::warn!("reply settled without candidate text"),
            Err(err) => tracing::error!(error = %err, "request failed"),
        }

        state.settle(reply)
    }
}
