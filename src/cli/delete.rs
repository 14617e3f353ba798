//! `hutarka delete` command implementation.

use crate::config::Config;
use crate::core::SessionStore;
use crate::error::{Error, Result};
use crate::storage::StateRepository;

use super::open_store;

/// Run the delete command.
///
/// # Errors
///
/// Returns an error if the storage backend fails or no conversation has this id.
pub fn run(config: &Config, id: &str) -> Result<()> {
    let mut store = open_store(config)?;
    delete(&mut store, id)?;
    println!("Deleted {id}. Active conversation: {}", store.active_id());
    Ok(())
}

/// Delete a conversation, refusing ids the store does not know.
fn delete<R: StateRepository>(store: &mut SessionStore<R>, id: &str) -> Result<()> {
    if store.get(id).is_none() {
        return Err(Error::ConversationNotFound(id.to_string()));
    }
    store.delete_conversation(id);
    Ok(())
}
