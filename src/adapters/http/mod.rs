//! HTTP adapters.

pub mod chat;
pub mod middleware;
