//! `TaskDesk` — terminal task manager library.

pub mod auth;
pub mod config;
pub mod notify;
pub mod session;
pub mod store;
pub mod tasks;
