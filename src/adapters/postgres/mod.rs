//! PostgreSQL adapters.

mod chat_store;
mod listing_reader;

pub use chat_store::PostgresChatStore;
pub use listing_reader::PostgresListingReader;
