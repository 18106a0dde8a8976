//! In-memory adapters.
//!
//! Back the integration test suite and local development without a
//! database. Not suitable for production: state is process-local and lost
//! on restart.

mod chat_store;
mod listing_reader;

pub use chat_store::InMemoryChatStore;
pub use listing_reader::InMemoryListingReader;
