//! Presentation-level configuration
//!
//! Configuration for output formatting and REPL behavior.

/// Output configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Show a spinner while requests are pending
    pub show_progress: bool,
    /// Line-editor history file; `None` uses the data directory
    pub history_file: Option<std::path::PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    /// History file to load and save, if one can be determined
    pub fn history_path(&self) -> Option<std::path::PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("empathy-chat").join("history.txt")))
    }
}
