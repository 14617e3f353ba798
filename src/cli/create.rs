//! `hutarka new` command implementation.

use crate::config::Config;
use crate::error::Result;

use super::open_store;

/// Run the new command: start a conversation and print its id.
///
/// # Errors
///
/// Returns an error if the storage backend fails.
pub fn run(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    let conversation = store.create_conversation();
    println!("{}", conversation.id);
    Ok(())
}
