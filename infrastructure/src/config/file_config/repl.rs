//! Interactive session settings (`[repl]` section)

use super::expand_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[repl]` table: how the chat prompt behaves between requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Spinner while a login, a chat send or a history fetch is pending.
    /// `--quiet` turns it off.
    pub show_progress: bool,
    /// Where sent chat lines are remembered between runs. Only message
    /// text is recorded, never `/login` input or passwords. Unset means
    /// `<data dir>/empathy-chat/history.txt`.
    pub history_file: Option<String>,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

impl FileReplConfig {
    /// Configured history file with `~/` expanded
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file.as_deref().map(expand_home)
    }
}
