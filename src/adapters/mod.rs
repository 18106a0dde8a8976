//! Adapters implementing the ports over concrete infrastructure.

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
