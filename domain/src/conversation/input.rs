//! Outgoing chat text value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Text the user submits as one chat turn (Value Object)
///
/// Blank input never reaches the network. The content is kept exactly as
/// typed; only the emptiness check looks at the trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInput {
    content: String,
}

impl ChatInput {
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            Err(DomainError::EmptyMessage)
        } else {
            Ok(Self { content })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for ChatInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
