//! The set of conversations and which one is active.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::core::exchange::MessageSink;
use crate::core::state::{Conversation, Message};
use crate::error::{Error, Result};
use crate::storage::StateRepository;

/// Owns every conversation and persists the whole set after each change.
///
/// There is always at least one conversation, and the active id always names
/// one of them.
#[derive(Debug)]
pub struct SessionStore<R: StateRepository> {
    repo: R,
    conversations: Vec<Conversation>,
    active_id: String,
}

/// Check that restored state can back a store.
fn check_restored(conversations: &[Conversation]) -> std::result::Result<(), &'static str> {
    if conversations.is_empty() {
        return Err("are empty");
    }
    if conversations.iter().any(|c| c.messages.is_empty()) {
        return Err("include one without messages");
    }
    let mut seen = HashSet::with_capacity(conversations.len());
    if !conversations.iter().all(|c| seen.insert(c.id.as_str())) {
        return Err("repeat an id");
    }
    Ok(())
}

impl<R: StateRepository> SessionStore<R> {
    /// Restore the persisted conversations, or start with a seeded one.
    ///
    /// Missing, unreadable or malformed state falls back to a single seeded
    /// conversation. An empty list, a conversation without messages, or a
    /// repeated id counts as malformed.
    pub fn initialize(repo: R) -> Self {
        let restored = match repo.load_conversations() {
            Ok(Some(conversations)) => match check_restored(&conversations) {
                Ok(()) => Some(conversations),
                Err(problem) => {
                    tracing::warn!("stored conversations {problem}, starting fresh");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("ignoring unreadable conversation state: {e}");
                None
            }
        };

        match restored {
            Some(conversations) => {
                let active_id = conversations[0].id.clone();
                Self {
                    repo,
                    conversations,
                    active_id,
                }
            }
            None => {
                let seeded = Conversation::seeded();
                let store = Self {
                    repo,
                    active_id: seeded.id.clone(),
                    conversations: vec![seeded],
                };
                store.persist();
                store
            }
        }
    }

    /// All conversations, most recent first.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Id of the active conversation.
    #[must_use]
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active conversation.
    #[must_use]
    pub fn active(&self) -> &Conversation {
        self.get(&self.active_id)
            .unwrap_or(&self.conversations[0])
    }

    /// Look up a conversation by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// The repository this store persists to.
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Start a new seeded conversation at the front of the list and make it active.
    pub fn create_conversation(&mut self) -> &Conversation {
        let conversation = Conversation::seeded();
        self.active_id = conversation.id.clone();
        self.conversations.insert(0, conversation);
        self.persist();
        &self.conversations[0]
    }

    /// Delete a conversation.
    ///
    /// Deleting the last one replaces it with a fresh seeded conversation.
    /// Deleting the active one activates the first remaining. Unknown ids are
    /// ignored.
    pub fn delete_conversation(&mut self, id: &str) {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return;
        }

        if self.conversations.is_empty() {
            let replacement = Conversation::seeded();
            self.active_id = replacement.id.clone();
            self.conversations.push(replacement);
        } else if self.active_id == id {
            self.active_id = self.conversations[0].id.clone();
        }
        self.persist();
    }

    /// Make an existing conversation active.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConversationNotFound` if no conversation has this id.
    pub fn select_conversation(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::ConversationNotFound(id.to_string()));
        }
        self.active_id = id.to_string();
        Ok(())
    }

    /// Replace a conversation's messages, deriving its title if still default.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConversationNotFound` if no conversation has this id.
    pub fn update_conversation_messages(&mut self, id: &str, messages: Vec<Message>) -> Result<()> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ConversationNotFound(id.to_string()))?;
        conversation.replace_messages(messages);
        self.persist();
        Ok(())
    }

    /// Save the whole set. Failures are logged; memory stays authoritative.
    fn persist(&self) {
        if let Err(e) = self.repo.save_conversations(&self.conversations) {
            tracing::warn!("failed to persist conversations: {e}");
        }
    }
}

impl<R: StateRepository> MessageSink for Mutex<SessionStore<R>> {
    fn messages_updated(&self, conversation_id: &str, messages: Vec<Message>) {
        let mut store = self.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = store.update_conversation_messages(conversation_id, messages) {
            tracing::warn!("dropping message update: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{DEFAULT_TITLE, GREETING, Role};
    use crate::storage::{CONVERSATIONS_KEY, MemoryBackend};
    use proptest::prelude::*;

    /// Repository whose writes always fail.
    struct ReadOnlyBackend;

    impl StateRepository for ReadOnlyBackend {
        fn load_conversations(&self) -> Result<Option<Vec<Conversation>>> {
            Ok(None)
        }

        fn save_conversations(&self, _conversations: &[Conversation]) -> Result<()> {
            Err(Error::Storage(std::io::Error::other("read-only")))
        }

        fn load_identity(&self) -> Result<Option<String>> {
            Ok(None)
        }

        fn save_identity(&self, _token: &str) -> Result<()> {
            Err(Error::Storage(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn first_launch_seeds_and_persists() {
        let repo = MemoryBackend::new();
        let store = SessionStore::initialize(&repo);

        assert_eq!(store.conversations().len(), 1);
        let active = store.active();
        assert_eq!(active.title, DEFAULT_TITLE);
        assert_eq!(active.messages[0].content, GREETING);
        assert_eq!(repo.load_conversations().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn restores_persisted_state_with_first_active() {
        let repo = MemoryBackend::new();
        let (first_id, second_id) = {
            let mut store = SessionStore::initialize(&repo);
            let second = store.active_id().to_string();
            let first = store.create_conversation().id.clone();
            (first, second)
        };

        let store = SessionStore::initialize(&repo);
        let ids: Vec<_> = store.conversations().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, [first_id.as_str(), second_id.as_str()]);
        assert_eq!(store.active_id(), first_id);
    }

    #[test]
    fn malformed_state_falls_back_to_seed() {
        let repo = MemoryBackend::new();
        repo.put_raw(CONVERSATIONS_KEY, r#"[{"id": 42}]"#);

        let store = SessionStore::initialize(&repo);
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active().messages[0].content, GREETING);
    }

    #[test]
    fn empty_state_falls_back_to_seed() {
        let repo = MemoryBackend::new();
        repo.put_raw(CONVERSATIONS_KEY, "[]");

        let store = SessionStore::initialize(&repo);
        assert_eq!(store.conversations().len(), 1);
    }

    #[test]
    fn conversation_without_messages_falls_back_to_seed() {
        let repo = MemoryBackend::new();
        let mut hollow = Conversation::seeded();
        hollow.id = "a".to_string();
        hollow.messages.clear();
        repo.put_raw(CONVERSATIONS_KEY, &serde_json::to_string(&[hollow]).unwrap());

        let store = SessionStore::initialize(&repo);
        assert_eq!(store.conversations().len(), 1);
        assert_ne!(store.active_id(), "a");
        assert_eq!(store.active().messages[0].content, GREETING);

        let persisted = repo.load_conversations().unwrap().unwrap();
        assert_eq!(persisted[0].messages.len(), 1);
    }

    #[test]
    fn repeated_ids_fall_back_to_seed() {
        let repo = MemoryBackend::new();
        let mut conversation = Conversation::seeded();
        conversation.id = "a".to_string();
        let twins = [conversation.clone(), conversation];
        repo.put_raw(CONVERSATIONS_KEY, &serde_json::to_string(&twins).unwrap());

        let mut store = SessionStore::initialize(&repo);
        assert_eq!(store.conversations().len(), 1);
        assert!(store.get("a").is_none());

        // A fresh store only ever holds unique ids, so deleting removes exactly one
        let kept = store.active_id().to_string();
        let created = store.create_conversation().id.clone();
        store.delete_conversation(&created);
        assert_eq!(store.conversations().len(), 1);
        assert_eq!(store.active_id(), kept);
    }

    #[test]
    fn create_prepends_and_activates() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let original = store.active_id().to_string();

        let created = store.create_conversation().id.clone();

        assert_eq!(store.conversations().len(), 2);
        assert_eq!(store.conversations()[0].id, created);
        assert_eq!(store.conversations()[1].id, original);
        assert_eq!(store.active_id(), created);
        assert_eq!(store.active().messages[0].role, Role::Assistant);
    }

    #[test]
    fn delete_last_creates_replacement() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let only = store.active_id().to_string();

        store.delete_conversation(&only);

        assert_eq!(store.conversations().len(), 1);
        assert_ne!(store.active_id(), only);
        assert_eq!(store.active().title, DEFAULT_TITLE);
    }

    #[test]
    fn delete_active_selects_first_remaining() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let oldest = store.active_id().to_string();
        let middle = store.create_conversation().id.clone();
        let newest = store.create_conversation().id.clone();
        store.select_conversation(&middle).unwrap();

        store.delete_conversation(&middle);

        assert_eq!(store.conversations().len(), 2);
        assert_eq!(store.active_id(), newest);
        assert!(store.get(&oldest).is_some());
    }

    #[test]
    fn delete_inactive_keeps_active() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let oldest = store.active_id().to_string();
        let newest = store.create_conversation().id.clone();

        store.delete_conversation(&oldest);

        assert_eq!(store.active_id(), newest);
        assert_eq!(store.conversations().len(), 1);
    }

    #[test]
    fn delete_unknown_is_noop() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let active = store.active_id().to_string();
        store.delete_conversation("no-such-id");
        assert_eq!(store.active_id(), active);
        assert_eq!(store.conversations().len(), 1);
    }

    #[test]
    fn select_unknown_is_error() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let active = store.active_id().to_string();
        let err = store.select_conversation("no-such-id").unwrap_err();
        assert!(matches!(err, Error::ConversationNotFound(_)));
        assert_eq!(store.active_id(), active);
    }

    #[test]
    fn update_derives_title_and_persists() {
        let repo = MemoryBackend::new();
        let mut store = SessionStore::initialize(&repo);
        let id = store.active_id().to_string();
        let mut messages = store.active().messages.clone();
        messages.push(Message::user("What is the capital of Poland, by the way?", Vec::new()).unwrap());

        store.update_conversation_messages(&id, messages).unwrap();

        assert_eq!(store.active().title, "What is the capital of Poland,...");
        let persisted = repo.load_conversations().unwrap().unwrap();
        assert_eq!(persisted[0].title, "What is the capital of Poland,...");
        assert_eq!(persisted[0].messages.len(), 2);
    }

    #[test]
    fn update_unknown_is_error() {
        let mut store = SessionStore::initialize(MemoryBackend::new());
        let result = store.update_conversation_messages("no-such-id", Vec::new());
        assert!(matches!(result, Err(Error::ConversationNotFound(_))));
    }

    #[test]
    fn failed_persist_keeps_memory_state() {
        let mut store = SessionStore::initialize(ReadOnlyBackend);
        let created = store.create_conversation().id.clone();
        assert_eq!(store.conversations().len(), 2);
        assert_eq!(store.active_id(), created);
    }

    #[test]
    fn mutex_store_receives_engine_updates() {
        let store = Mutex::new(SessionStore::initialize(MemoryBackend::new()));
        let (id, mut messages) = {
            let guard = store.lock().unwrap();
            (guard.active_id().to_string(), guard.active().messages.clone())
        };
        messages.push(Message::user("hello", Vec::new()).unwrap());

        store.messages_updated(&id, messages);

        let guard = store.lock().unwrap();
        assert_eq!(guard.active().messages.len(), 2);
        assert_eq!(guard.active().title, "hello");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        DeleteActive,
        DeleteAt(usize),
        SelectAt(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Create),
            Just(Op::DeleteActive),
            (0usize..8).prop_map(Op::DeleteAt),
            (0usize..8).prop_map(Op::SelectAt),
        ]
    }

    proptest! {
        #[test]
        fn never_empty_and_active_resolves(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let mut store = SessionStore::initialize(MemoryBackend::new());
            for op in ops {
                match op {
                    Op::Create => {
                        store.create_conversation();
                    }
                    Op::DeleteActive => {
                        let id = store.active_id().to_string();
                        store.delete_conversation(&id);
                    }
                    Op::DeleteAt(i) => {
                        let len = store.conversations().len();
                        let id = store.conversations()[i % len].id.clone();
                        store.delete_conversation(&id);
                    }
                    Op::SelectAt(i) => {
                        let len = store.conversations().len();
                        let id = store.conversations()[i % len].id.clone();
                        store.select_conversation(&id).unwrap();
                    }
                }
                prop_assert!(!store.conversations().is_empty());
                prop_assert!(store.get(store.active_id()).is_some());
            }
        }
    }
}
