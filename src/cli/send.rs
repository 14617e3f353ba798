//! `hutarka send` command implementation.

use crate::client::{ChatEndpoint, HttpEndpoint};
use crate::config::Config;
use crate::core::{
    ExchangeEngine, FileInput, PendingAttachments, SendOutcome, SessionStore, caller_identity,
    read_attachments,
};
use crate::error::Result;
use crate::storage::StateRepository;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{format_message, open_store};

/// Run the send command.
///
/// Sends `text` (plus any attached files) in the chosen conversation, or the
/// active one, and prints the assistant's answer.
///
/// # Errors
///
/// Returns an error if the storage backend fails, the conversation is not
/// found, or the HTTP client cannot be built. Exchange failures are printed as
/// part of the conversation instead.
pub async fn run(
    config: &Config,
    chat: Option<&str>,
    attach: &[PathBuf],
    text: &str,
) -> Result<()> {
    let mut store = open_store(config)?;
    if let Some(id) = chat {
        store.select_conversation(id)?;
    }

    let mut pending = PendingAttachments::new();
    let mut files = Vec::with_capacity(attach.len());
    for path in attach {
        match FileInput::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => eprintln!("hutarka: warning: skipping {}: {e}", path.display()),
        }
    }
    let batch = read_attachments(files).await;
    for rejection in &batch.rejected {
        eprintln!("hutarka: warning: {rejection}");
    }
    pending.add(batch.attachments);

    let http = HttpEndpoint::new(&config.endpoint)?;
    tracing::debug!(url = http.url(), "posting to chat endpoint");
    let endpoint: Arc<dyn ChatEndpoint> = Arc::new(http);
    let (outcome, _) = send(store, endpoint, config.endpoint.timeout(), text, pending).await;

    match outcome {
        SendOutcome::Ignored => println!("Nothing to send."),
        SendOutcome::Replied(message) | SendOutcome::Failed(message) => {
            print!("{}", format_message(&message));
        }
    }
    Ok(())
}

/// Send through an engine bound to the store's active conversation, handing
/// the updated store back.
async fn send<R: StateRepository>(
    store: SessionStore<R>,
    endpoint: Arc<dyn ChatEndpoint>,
    timeout: Duration,
    text: &str,
    mut pending: PendingAttachments,
) -> (SendOutcome, SessionStore<R>) {
    let identity = caller_identity(store.repository());
    let engine = ExchangeEngine::new(endpoint, identity, timeout, store.active());
    let store = Mutex::new(store);
    let outcome = engine.send_message(text, pending.take(), &store).await;
    (outcome, store.into_inner().unwrap_or_else(PoisonError::into_inner))
}
