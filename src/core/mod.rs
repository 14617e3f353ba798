//! Conversation state, message exchange, and attachment handling.

pub mod attachment;
pub mod exchange;
pub mod identity;
pub mod session;
pub mod state;

pub use attachment::{
    AttachmentBatch, FileInput, MAX_ATTACHMENT_SIZE, PendingAttachments, RejectReason, Rejection,
    read_attachments,
};
pub use exchange::{ExchangeEngine, ExchangeStatus, MessageSink, SendOutcome};
pub use identity::caller_identity;
pub use session::SessionStore;
pub use state::{Attachment, Conversation, Message, Role};
