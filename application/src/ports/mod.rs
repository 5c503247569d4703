//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod chat_api;
pub mod conversation_logger;
pub mod credential;
pub mod key_value_store;
pub mod progress;
