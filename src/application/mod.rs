//! Application layer: use-case services over the ports.

pub mod chat;
