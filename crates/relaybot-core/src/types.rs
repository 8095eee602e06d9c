use serde::{Deserialize, Serialize};

/// Role of a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in a conversation transcript, in the completion API's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An inbound chat message reduced to what the pipeline needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Stable identifier of the chat thread, stringified for store keys.
    pub conversation_id: String,
    /// Plain-text content; absent for media and other non-text payloads.
    pub text: Option<String>,
}

impl InboundMessage {
    pub fn new(conversation_id: impl Into<String>, text: Option<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text,
        }
    }
}
