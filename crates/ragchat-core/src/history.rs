//! Conversation history types.
//!
//! The history belongs to whoever drives the session (typically the UI shell),
//! not to the session manager.

use crate::query::{Citation, QueryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Message from the user.
    User,
    /// Message from the model.
    Model,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    /// Evidence for the answer. Always empty for user turns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    pub timestamp: DateTime<Utc>,
}

/// Append-only ordered sequence of conversation turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    turns: Vec<ConversationTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role: TurnRole::User,
            text: text.into(),
            citations: Vec::new(),
            timestamp: Utc::now(),
        });
    }

    /// Appends the model's answer together with its citations.
    pub fn push_answer(&mut self, result: QueryResult) {
        self.turns.push(ConversationTurn {
            role: TurnRole::Model,
            text: result.answer_text,
            citations: result.citations,
            timestamp: Utc::now(),
        });
    }

    /// Appends a model turn without citations (used for error notices).
    pub fn push_model_notice(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role: TurnRole::Model,
            text: text.into(),
            citations: Vec::new(),
            timestamp: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drops every turn. Used when a session ends.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
