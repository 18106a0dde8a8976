//! Motorline Chat - Realtime buyer/seller messaging for the Motorline
//! marketplace.
//!
//! This crate implements the chat subsystem: listing-scoped conversations
//! between buyers and sellers, delivered over WebSocket rooms with a REST
//! fallback surface.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
