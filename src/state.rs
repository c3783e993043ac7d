//! UI-agnostic chat state types shared between the event handler, the
//! renderer, and the draw code.

use chrono::{DateTime, Local};
use uuid::Uuid;

/// One turn in the visible conversation. Messages are appended to the chat
/// history and never mutated or removed afterwards.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
    pub is_error: bool,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String, is_error: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Local::now(),
            is_error,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content.into(), false)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Model, content.into(), false)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Model, content.into(), true)
    }
}
