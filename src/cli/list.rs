//! `hutarka list` command implementation.

use crate::config::Config;
use crate::core::SessionStore;
use crate::error::Result;
use crate::storage::StateRepository;
use std::io::{self, Write};

use super::{format_local_time, open_store};

/// Run the list command.
///
/// Shows every conversation, most recent first, marking the active one.
///
/// # Errors
///
/// Returns an error if the storage backend fails or stdout cannot be written.
pub fn run(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    render(&store, &mut io::stdout().lock())
}

/// Write the conversation table.
fn render<R: StateRepository>(store: &SessionStore<R>, out: &mut impl Write) -> Result<()> {
    writeln!(out, "  {:<38} {:<18} {:>5}  Title", "Conversation ID", "Updated", "Msgs")?;
    writeln!(out, "{}", "─".repeat(90))?;

    for conversation in store.conversations() {
        let marker = if conversation.id == store.active_id() { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {:<38} {:<18} {:>5}  {}",
            conversation.id,
            format_local_time(conversation.updated_at),
            conversation.messages.len(),
            conversation.title
        )?;
    }

    writeln!(out, "{}", "─".repeat(90))?;
    writeln!(out, "Showing {} conversation(s)", store.conversations().len())?;
    Ok(())
}
