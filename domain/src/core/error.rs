//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Invalid conversation id: {0:?}")]
    InvalidConversationId(String),
}

impl DomainError {
    /// Check if this error was caused by user input that can simply be re-entered
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyMessage | DomainError::MissingField(_)
        )
    }
}
