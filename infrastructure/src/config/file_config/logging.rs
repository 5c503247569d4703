//! Log destinations from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Diagnostic log file; stderr when unset
    pub file: Option<String>,
    /// JSONL transcript of sent messages and replies
    pub conversation_log: Option<String>,
}
