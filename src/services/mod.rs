//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the business logic — presence mutation, chat
//! persistence, profile lookups — so route handlers stay focused on protocol
//! translation. Services return typed results; deciding to log-and-drop a
//! failed fire-and-forget event is the transport layer's call.

pub mod chat;
pub mod location;
pub mod profile;
