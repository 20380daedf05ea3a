//! Chat message entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display format for message timestamps (hours and minutes, local time).
pub const TIMESTAMP_FORMAT: &str = "%H:%M";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Typed by the person at the keyboard.
    User,
    /// Revealed by the sequencer.
    System,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single immutable entry in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (UUID v7).
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    /// Local wall-clock time of creation, formatted as `HH:MM`.
    pub timestamp: String,
}

impl Message {
    /// Create a message stamped with the current local time.
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            sender,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Shorthand for a [`Sender::User`] message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    /// Shorthand for a [`Sender::System`] message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Sender::System, content)
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
