//! CLI command implementations.

pub mod create;
pub mod delete;
pub mod list;
pub mod send;
pub mod show;

use crate::config::Config;
use crate::core::{Message, Role, SessionStore};
use crate::error::Result;
use crate::storage::FileBackend;
use chrono::{DateTime, Local, Utc};

/// Open the conversation store under the configured storage directory.
///
/// # Errors
///
/// Returns an error if the storage directory cannot be created.
pub fn open_store(config: &Config) -> Result<SessionStore<FileBackend>> {
    let backend = FileBackend::new(config.storage.path.clone())?;
    tracing::debug!(dir = %backend.base_dir().display(), "opened state directory");
    Ok(SessionStore::initialize(backend))
}

/// Format UTC time as local time for display.
fn format_local_time(utc: DateTime<Utc>) -> String {
    let local: DateTime<Local> = utc.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

/// Render one message as a transcript block.
fn format_message(message: &Message) -> String {
    let author = match message.role {
        Role::User => "you",
        Role::Assistant => "hutarka",
    };
    format!(
        "[{}] {author}:\n{}\n",
        format_local_time(message.timestamp),
        message.content.trim_end()
    )
}
