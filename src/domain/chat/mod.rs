//! Chat domain: conversations between a buyer and a listing's seller.

mod conversation;
mod errors;
mod message;

pub use conversation::{Conversation, Party};
pub use errors::ChatError;
pub use message::{Message, MessageKind};
