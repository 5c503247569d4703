//! Domain layer for empathy-chat
//!
//! This crate contains the entities and value objects of the chat client.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A [`SessionToken`] is the opaque bearer credential issued on login. While
//! one exists every API call carries it; signing out destroys it.
//!
//! ## Conversation
//!
//! A conversation is an append-only list of [`Message`]s. A conversation
//! without a [`ConversationId`] is a draft; the server assigns the id when
//! the first message is sent.

pub mod auth;
pub mod config;
pub mod conversation;
pub mod core;
pub mod greeting;

// Re-export commonly used types
pub use auth::{
    credentials::{Credentials, SignupForm},
    token::SessionToken,
    user::User,
};
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use conversation::{
    entities::{Conversation, ConversationId, HistoryEntry, Message, Role},
    input::ChatInput,
};
pub use core::error::DomainError;
pub use greeting::Greeting;
