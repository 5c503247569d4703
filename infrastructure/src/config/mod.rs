//! Configuration file loading for empathy-chat
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `EMPATHY_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./empathy.toml` or `./.empathy.toml`
//! 4. Global: `$XDG_CONFIG_HOME/empathy-chat/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS, FileApiConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FileReplConfig, FileSessionConfig, StorageKind, expand_home,
};
pub use loader::ConfigLoader;
