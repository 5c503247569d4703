//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod authenticate;
pub mod conversation;
pub mod session_store;
