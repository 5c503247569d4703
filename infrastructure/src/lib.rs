//! Infrastructure layer for empathy-chat
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod http;
pub mod logging;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigLoader, DEFAULT_BASE_URL, FileApiConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FileReplConfig, FileSessionConfig, StorageKind, expand_home,
};
pub use http::{HttpChatApi, HttpSetupError};
pub use logging::JsonlConversationLogger;
pub use storage::{FileKeyValueStore, MemoryKeyValueStore};
