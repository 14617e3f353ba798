//! Storage backends for conversation state.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use traits::StateRepository;

/// Key under which the conversation array is stored.
pub const CONVERSATIONS_KEY: &str = "chats";

/// Key under which the caller identity token is stored.
pub const IDENTITY_KEY: &str = "user_id";
