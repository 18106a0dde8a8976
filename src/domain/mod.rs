//! Domain layer: value objects and the chat aggregate.

pub mod chat;
pub mod foundation;
