//! In-memory storage backend for testing.

use crate::core::Conversation;
use crate::error::Result;
use crate::storage::traits::StateRepository;
use crate::storage::{CONVERSATIONS_KEY, IDENTITY_KEY};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage backend.
///
/// Values are kept as serialized strings under the same keys the file backend
/// uses, so malformed state can be planted directly.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create a new in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw value under a key, bypassing serialization.
    pub fn put_raw(&self, key: &str, value: &str) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(key.to_string(), value.to_string());
    }

    /// Read the raw value stored under a key.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap();
        entries.get(key).cloned()
    }
}

impl StateRepository for MemoryBackend {
    fn load_conversations(&self) -> Result<Option<Vec<Conversation>>> {
        match self.get_raw(CONVERSATIONS_KEY) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        let raw = serde_json::to_string(conversations)?;
        self.put_raw(CONVERSATIONS_KEY, &raw);
        Ok(())
    }

    fn load_identity(&self) -> Result<Option<String>> {
        Ok(self.get_raw(IDENTITY_KEY))
    }

    fn save_identity(&self, token: &str) -> Result<()> {
        self.put_raw(IDENTITY_KEY, token);
        Ok(())
    }
}
