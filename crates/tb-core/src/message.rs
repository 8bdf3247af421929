//! Conversation history in the OpenAI chat message shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role/content pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Render as `"{role}: {content}"`.
    pub fn render_line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// Conversation memory kept by the reasoning library.
///
/// Produces the ordered message sequence, oldest first.
pub trait ConversationMemory {
    fn to_messages(&self) -> Vec<ChatMessage>;
}

impl ConversationMemory for [ChatMessage] {
    fn to_messages(&self) -> Vec<ChatMessage> {
        self.to_vec()
    }
}

impl ConversationMemory for Vec<ChatMessage> {
    fn to_messages(&self) -> Vec<ChatMessage> {
        self.clone()
    }
}
