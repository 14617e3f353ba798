//! `hutarka show` command implementation.

use crate::config::Config;
use crate::core::{Conversation, SessionStore};
use crate::core::attachment::format_file_size;
use crate::error::{Error, Result};
use crate::storage::StateRepository;
use std::io::{self, Write};

use super::{format_message, open_store};

/// Run the show command.
///
/// Prints a conversation's transcript, or its raw JSON with `--json`.
/// Without an id, shows the active conversation.
///
/// # Errors
///
/// Returns an error if the storage backend fails or the conversation is not found.
pub fn run(config: &Config, id: Option<&str>, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let conversation = resolve(&store, id)?;
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(conversation)?)?;
        Ok(())
    } else {
        render(conversation, &mut out)
    }
}

fn resolve<'a, R: StateRepository>(
    store: &'a SessionStore<R>,
    id: Option<&str>,
) -> Result<&'a Conversation> {
    match id {
        Some(id) => store
            .get(id)
            .ok_or_else(|| Error::ConversationNotFound(id.to_string())),
        None => Ok(store.active()),
    }
}

/// Write a readable transcript.
fn render(conversation: &Conversation, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{} ({})", conversation.title, conversation.id)?;
    writeln!(out, "{}", "─".repeat(60))?;
    for message in &conversation.messages {
        write!(out, "{}", format_message(message))?;
        for attachment in message.attachments.iter().flatten() {
            writeln!(
                out,
                "  📎 {} ({}, {})",
                attachment.name,
                attachment.mime_type,
                format_file_size(attachment.size)
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}
