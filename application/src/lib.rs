//! Application layer for empathy-chat
//!
//! This crate contains use cases and port definitions.
//! It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    chat_api::{ApiError, ChatApi, ChatReply, LoginResponse},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    credential::CredentialSlot,
    key_value_store::{KeyValueStore, StoreError},
    progress::{ChatProgress, NoProgress},
};
pub use use_cases::authenticate::{AuthenticateError, AuthenticateUseCase, Profile};
pub use use_cases::conversation::{
    ConversationController, ConversationError, ConversationPhase, ConversationSnapshot,
    SEND_FAILED_REPLY, SelectOutcome, SendOutcome, SendRejection,
};
pub use use_cases::session_store::{SessionStore, SessionStoreError, TOKEN_KEY};
