//! Conversation domain.
//!
//! - [`entities::Message`]: a single chat turn
//! - [`entities::ConversationId`]: server-assigned conversation identity
//! - [`entities::HistoryEntry`]: one row of the conversation history list
//! - [`input::ChatInput`]: validated outgoing user text

pub mod entities;
pub mod input;
