//! Raw TOML configuration data types
//!
//! These structs mirror the config file one-to-one. Values that need
//! parsing (URLs, storage kinds) stay strings here and are checked by
//! [`FileConfig::validate`].

mod api;
mod logging;
mod output;
mod repl;
mod session;

pub use api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS, FileApiConfig};
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use repl::FileReplConfig;
pub use session::{FileSessionConfig, StorageKind};

use empathy_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat service connection
    pub api: FileApiConfig,
    /// Where the session token is kept
    pub session: FileSessionConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.api.validate();
        issues.extend(self.session.validate());
        issues
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
