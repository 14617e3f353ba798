//! hutarka - multi-conversation chat client.
//!
//! Keeps named conversation threads on local disk and exchanges messages,
//! optionally with file attachments, with a remote assistant over HTTP.

pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
