//! Chat use cases.

mod service;

pub use service::{ChatService, ConversationWithMessages, MarkReadOutcome};
