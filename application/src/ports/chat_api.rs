//! Chat API port
//!
//! Defines the interface for talking to the remote chat service. Every
//! operation is one request/response exchange with no retry or backoff.

use async_trait::async_trait;
use empathy_domain::{
    ChatInput, ConversationId, Credentials, HistoryEntry, Message, SignupForm, User,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during chat API operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },

    #[error("Request rejected ({status}): {body}")]
    Validation { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Invalid credentials or an expired/invalid token
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth { status, .. }
            | ApiError::Validation { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }
}

/// Successful login payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Server answer to one chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub ai_response: String,
    pub conversation_id: ConversationId,
    /// Emotion the server detected in the user's message, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_emotion: Option<String>,
}

/// Gateway to the chat service
///
/// Implementations attach the current session's bearer credential to every
/// call except [`login`](ChatApi::login) and [`signup`](ChatApi::signup).
/// Calls are not queued; callers serialize them.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Exchange credentials for a bearer token
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    /// Register a new account
    async fn signup(&self, form: &SignupForm) -> Result<User, ApiError>;

    /// Profile of the token's owner
    async fn fetch_current_user(&self) -> Result<User, ApiError>;

    /// Conversation summaries for the current user, in server order
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    /// Full message list of one conversation
    async fn fetch_conversation(&self, id: &ConversationId) -> Result<Vec<Message>, ApiError>;

    /// Submit one user turn. Without a conversation id the server creates a
    /// new conversation and returns its id with the reply.
    async fn send_message(
        &self,
        input: &ChatInput,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ChatReply, ApiError>;
}
