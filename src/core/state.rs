//! Conversation state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to every conversation until its first user message.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Assistant message every conversation starts with.
pub const GREETING: &str = "Hi! I'm Hutarka, your AI assistant. How are you doing? How can I help?";

/// Maximum number of characters of the first user message used as a title.
const TITLE_MAX_CHARS: usize = 30;

/// Generate a fresh opaque identifier.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A file attached to a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Identifier, unique within its message.
    pub id: String,

    /// Display name of the file.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// MIME-like type tag (e.g. `text/plain`).
    #[serde(rename = "type")]
    pub mime_type: String,

    /// Literal text, a `data:` URL for images, or a placeholder.
    pub content: String,
}

impl Attachment {
    /// Whether the content is decoded text that can be inlined into a message body.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        is_textual_type(&self.mime_type)
    }
}

/// `text/*` and `application/json` are read and inlined as text.
#[must_use]
pub fn is_textual_type(mime_type: &str) -> bool {
    mime_type.starts_with("text/") || mime_type == "application/json"
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the person using the client.
    User,
    /// Produced by the remote assistant (or by the client on failure).
    Assistant,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier, unique within its conversation.
    pub id: String,

    /// Who wrote it.
    pub role: Role,

    /// Text body.
    pub content: String,

    /// When the message was created.
    pub timestamp: DateTime<Utc>,

    /// Files attached to a user message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Message {
    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            attachments: None,
        }
    }

    /// Create a user message.
    ///
    /// Returns `None` when there is neither text nor an attachment.
    #[must_use]
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() && attachments.is_empty() {
            return None;
        }
        Some(Self {
            id: new_id(),
            role: Role::User,
            content,
            timestamp: Utc::now(),
            attachments: (!attachments.is_empty()).then_some(attachments),
        })
    }
}

/// A named conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Identifier, unique within the session store.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Messages in conversation order.
    pub messages: Vec<Message>,

    /// When the conversation was created.
    pub created_at: DateTime<Utc>,

    /// When the message list last changed.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a conversation holding only the greeting.
    #[must_use]
    pub fn seeded() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: DEFAULT_TITLE.to_string(),
            messages: vec![Message::assistant(GREETING)],
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the message list, deriving a title from the first user message
    /// while the default title is still in place.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        if self.title == DEFAULT_TITLE && messages.len() > 1 {
            if let Some(first) = messages.iter().find(|m| m.role == Role::User) {
                self.title = derive_title(&first.content);
            }
        }
        self.messages = messages;
        self.updated_at = Utc::now();
    }
}

/// Shorten message content to a title, marking truncation with an ellipsis.
#[must_use]
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
