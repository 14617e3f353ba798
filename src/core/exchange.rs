//! Message exchange with the remote assistant.
//!
//! An [`ExchangeEngine`] owns the message list of one conversation. Sending
//! appends the user message, hands the list to a [`MessageSink`] before the
//! network call, then appends the assistant reply (or an error turn) and hands
//! the list over again. Failures never leave the engine as errors; they become
//! assistant messages.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

use crate::client::{ChatEndpoint, ChatRequest};
use crate::core::state::{Attachment, Conversation, Message};
use crate::error::{Error, Result};

/// Reply text used when the endpoint answers without one.
pub const FALLBACK_REPLY: &str = "Error receiving a response from the server";

/// Prefix of assistant messages that report a failed exchange.
pub const ERROR_PREFIX: &str = "Error: ";

/// Receives every new message list of a conversation.
pub trait MessageSink {
    /// Called with the full, updated message list.
    fn messages_updated(&self, conversation_id: &str, messages: Vec<Message>);
}

/// Exchange state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// Ready to send.
    Idle,
    /// Waiting for the endpoint.
    Sending,
}

/// What became of a send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send, or another send was in flight.
    Ignored,
    /// The endpoint replied; carries the assistant message.
    Replied(Message),
    /// The exchange failed; carries the error turn.
    Failed(Message),
}

/// Per-conversation send/receive state machine.
pub struct ExchangeEngine {
    endpoint: Arc<dyn ChatEndpoint>,
    identity: String,
    timeout: Duration,
    conversation_id: Mutex<String>,
    messages: Mutex<Vec<Message>>,
    sending: AtomicBool,
    updates: watch::Sender<usize>,
}

/// Returns the engine to `Idle` when the exchange ends, however it ends.
struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExchangeEngine {
    /// Create an engine for a conversation.
    #[must_use]
    pub fn new(
        endpoint: Arc<dyn ChatEndpoint>,
        identity: impl Into<String>,
        timeout: Duration,
        conversation: &Conversation,
    ) -> Self {
        let (updates, _) = watch::channel(conversation.messages.len());
        Self {
            endpoint,
            identity: identity.into(),
            timeout,
            conversation_id: Mutex::new(conversation.id.clone()),
            messages: Mutex::new(conversation.messages.clone()),
            sending: AtomicBool::new(false),
            updates,
        }
    }

    /// Switch to another conversation's messages.
    ///
    /// Returns `false` and changes nothing while a send is in flight. The
    /// engine counts as sending for the duration of the swap.
    pub fn load(&self, conversation: &Conversation) -> bool {
        if !self.claim() {
            return false;
        }
        let _guard = SendingGuard(&self.sending);
        *lock(&self.conversation_id) = conversation.id.clone();
        self.replace_messages(conversation.messages.clone());
        true
    }

    /// Current state.
    #[must_use]
    pub fn status(&self) -> ExchangeStatus {
        if self.is_sending() {
            ExchangeStatus::Sending
        } else {
            ExchangeStatus::Idle
        }
    }

    /// Whether a send is in flight.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Id of the conversation this engine works on.
    #[must_use]
    pub fn conversation_id(&self) -> String {
        lock(&self.conversation_id).clone()
    }

    /// Snapshot of the message list.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.messages).clone()
    }

    /// Subscribe to "new content appended" hints; the value is the message count.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.updates.subscribe()
    }

    /// Send a message and wait for the assistant's answer.
    ///
    /// Blank text with no attachments, or a send while another is in flight,
    /// is ignored.
    pub async fn send_message(
        &self,
        text: &str,
        attachments: Vec<Attachment>,
        sink: &dyn MessageSink,
    ) -> SendOutcome {
        if text.trim().is_empty() && attachments.is_empty() {
            return SendOutcome::Ignored;
        }
        if !self.claim() {
            tracing::debug!("send ignored: exchange already in flight");
            return SendOutcome::Ignored;
        }
        let _guard = SendingGuard(&self.sending);
        let conversation_id = self.conversation_id();

        let content = compose_content(text, &attachments);
        let Some(user_message) = Message::user(content.clone(), attachments) else {
            return SendOutcome::Ignored;
        };
        self.append(&conversation_id, user_message, sink);

        let request = ChatRequest {
            user_id: self.identity.clone(),
            message: content,
        };
        match self.exchange(&request).await {
            Ok(reply) => {
                let message = Message::assistant(reply);
                self.append(&conversation_id, message.clone(), sink);
                SendOutcome::Replied(message)
            }
            Err(e) => {
                tracing::warn!(transport = e.is_transport(), "exchange failed: {e}");
                let message = Message::assistant(format!("{ERROR_PREFIX}{e}"));
                self.append(&conversation_id, message.clone(), sink);
                SendOutcome::Failed(message)
            }
        }
    }

    async fn exchange(&self, request: &ChatRequest) -> Result<String> {
        let reply = tokio::time::timeout(self.timeout, self.endpoint.chat(request))
            .await
            .map_err(|_| Error::Timeout(self.timeout))??;
        Ok(reply
            .text()
            .map_or_else(|| FALLBACK_REPLY.to_string(), str::to_string))
    }

    /// Move from `Idle` to `Sending`; `false` if already sending.
    fn claim(&self) -> bool {
        self.sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn append(&self, conversation_id: &str, message: Message, sink: &dyn MessageSink) {
        let snapshot = {
            let mut messages = lock(&self.messages);
            messages.push(message);
            messages.clone()
        };
        self.updates.send_replace(snapshot.len());
        sink.messages_updated(conversation_id, snapshot);
    }

    fn replace_messages(&self, messages: Vec<Message>) {
        let count = messages.len();
        *lock(&self.messages) = messages;
        self.updates.send_replace(count);
    }
}

/// Build the outbound text: trimmed user text, then a manifest of attachments
/// with textual contents inlined.
#[must_use]
pub fn compose_content(text: &str, attachments: &[Attachment]) -> String {
    let mut content = text.trim().to_string();
    if attachments.is_empty() {
        return content;
    }

    content.push_str("\n\nAttached files:\n");
    for attachment in attachments {
        let _ = writeln!(content, "- {} ({})", attachment.name, attachment.mime_type);
        if attachment.is_textual() {
            let _ = writeln!(content, "Content: {}", attachment.content);
        }
    }
    content
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
