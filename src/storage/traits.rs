//! Storage trait definitions.

use crate::core::Conversation;
use crate::error::Result;

/// Durable local state: the conversation set and the caller identity token.
pub trait StateRepository: Send + Sync {
    /// Load the persisted conversations.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored data cannot be read or parsed.
    fn load_conversations(&self) -> Result<Option<Vec<Conversation>>>;

    /// Replace the persisted conversations.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn save_conversations(&self, conversations: &[Conversation]) -> Result<()>;

    /// Load the caller identity token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn load_identity(&self) -> Result<Option<String>>;

    /// Save the caller identity token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn save_identity(&self, token: &str) -> Result<()>;
}

impl<R: StateRepository + ?Sized> StateRepository for &R {
    fn load_conversations(&self) -> Result<Option<Vec<Conversation>>> {
        (**self).load_conversations()
    }

    fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        (**self).save_conversations(conversations)
    }

    fn load_identity(&self) -> Result<Option<String>> {
        (**self).load_identity()
    }

    fn save_identity(&self, token: &str) -> Result<()> {
        (**self).save_identity(token)
    }
}
