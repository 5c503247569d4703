//! HTTP adapter for the chat service
//!
//! Implements the [`ChatApi`](empathy_application::ChatApi) port over
//! reqwest.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{DEFAULT_TIMEOUT, HttpChatApi};
pub use error::HttpSetupError;
