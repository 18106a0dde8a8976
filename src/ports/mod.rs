//! Ports: interfaces between the application core and the outside world.
//!
//! The chat core owns none of its durable state. Conversations and messages
//! live behind [`ChatStore`], listings behind [`ListingReader`], credential
//! verification behind [`SessionValidator`], and live-connection tracking
//! behind [`ConnectionRegistry`].

mod chat_store;
mod connection_registry;
mod listing_reader;
mod session_validator;

pub use chat_store::{
    ChatStore, ChatStoreError, ConversationOverview, UserSummary,
};
pub use connection_registry::{ClientId, ConnectionRegistry};
pub use listing_reader::{ListingReader, ListingReaderError, ListingSummary};
pub use session_validator::SessionValidator;
