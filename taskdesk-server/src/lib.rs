//! `TaskDesk` server library.
//!
//! Exposes the task server for use in tests and embedding. The server
//! accepts WebSocket connections and answers postcard-encoded requests
//! against in-memory account, session, and task state.

pub mod auth;
pub mod config;
pub mod server;
pub mod tasks;
