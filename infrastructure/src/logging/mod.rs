//! Transcript logging.
//!
//! [`JsonlConversationLogger`] appends conversation events to a JSONL file and
//! implements the [`ConversationLogger`](empathy_application::ConversationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
