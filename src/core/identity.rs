//! Caller identity token.
//!
//! Generated once per storage directory and sent with every request so the
//! endpoint can correlate turns without a server-side session.

use crate::storage::StateRepository;
use uuid::Uuid;

const TOKEN_PREFIX: &str = "user_";
const SUFFIX_LEN: usize = 12;

/// Load the stored token, creating and saving a new one if there is none.
///
/// Storage failures never prevent a token from being returned: a token that
/// could not be saved is still used for this process.
pub fn caller_identity(repo: &dyn StateRepository) -> String {
    match repo.load_identity() {
        Ok(Some(token)) => return token,
        Ok(None) => {}
        Err(e) => tracing::warn!("failed to load caller identity: {e}"),
    }

    let token = generate_token();
    if let Err(e) = repo.save_identity(&token) {
        tracing::warn!("failed to persist caller identity: {e}");
    }
    token
}

fn generate_token() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{TOKEN_PREFIX}{}", &random[..SUFFIX_LEN])
}
