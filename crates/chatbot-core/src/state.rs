//! UI-agnostic session state
//!
//! Everything the render surface reads lives here. The transcript is
//! append-only: the only way in is through [`SessionState`], and nothing
//! hands out a mutable view of an appended message.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, CompletionError};

/// Assistant text used when a successful response carries no candidate text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response from the model.";

/// Marker prepended to assistant entries that report a failed request.
pub const ERROR_MARKER: &str = "❌ Error: ";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Ordered, append-only list of exchanged messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    fn push(&mut self, message: Message) -> &Message {
        let index = self.messages.len();
        self.messages.push(message);
        &self.messages[index]
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Result delivered by a finished completion request: the first candidate's
/// text when the model produced one.
pub type Reply = Result<Option<String>, CompletionError>;

/// Everything one chat session holds. Owned by the app, lent to the
/// controller by `&mut` for each transition.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub transcript: Transcript,
    pub pending_input: String,
    is_busy: bool,
    last_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True exactly while one request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    /// Transient local error (never part of the transcript).
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn reject(&mut self, error: &ChatError) {
        self.last_error = Some(error.to_string());
    }

    /// Idle -> AwaitingResponse.
    pub(crate) fn begin(&mut self, text: &str) {
        self.transcript.push(Message::user(text));
        self.pending_input.clear();
        self.is_busy = true;
        self.last_error = None;
    }

    /// AwaitingResponse -> Idle. Appends exactly one assistant message.
    pub(crate) fn settle(&mut self, reply: Reply) -> &Message {
        let message = match reply {
            Ok(Some(text)) if !text.is_empty() => Message::assistant(text),
            Ok(_) => Message::assistant(NO_RESPONSE_PLACEHOLDER),
            Err(err) => Message::assistant(format!("{}{}", ERROR_MARKER, err.user_message())),
        };
        self.is_busy = false;
        self.transcript.push(message)
    }
}
