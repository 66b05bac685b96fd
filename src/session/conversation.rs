//! Conversation log: the ordered user/assistant transcript of one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::types::ModelMessage;

/// Prefix of the assistant turn that records a failed turn.
pub const TURN_ERROR_PREFIX: &str = "❌ Error processing request: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One user message or one assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn to_model_message(&self) -> ModelMessage {
        match self.role {
            TurnRole::User => ModelMessage::user(self.text.clone()),
            TurnRole::Assistant => ModelMessage::assistant(self.text.clone()),
        }
    }
}

/// Append-only transcript. Insertion order is the replay order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Empty the log. The only mutation besides [`append`](Self::append).
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// The most recent `window` turns of `history`, or all of it when `window` is `None`.
pub fn windowed(history: &[Turn], window: Option<usize>) -> &[Turn] {
    match window {
        Some(n) if n < history.len() => &history[history.len() - n..],
        _ => history,
    }
}
