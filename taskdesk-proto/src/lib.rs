//! Shared protocol definitions for the `TaskDesk` wire format.

pub mod codec;
pub mod task;
pub mod user;
pub mod wire;
