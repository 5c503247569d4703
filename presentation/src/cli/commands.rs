//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for empathy-chat
#[derive(Parser, Debug)]
#[command(name = "empathy-chat")]
#[command(author, version, about = "Terminal client for the empathetic chat service")]
#[command(long_about = r#"
empathy-chat signs you in to the chat service and opens an interactive
conversation. Past conversations can be listed and reopened.

Configuration files are loaded from (in priority order):
1. EMPATHY_* environment variables (e.g. EMPATHY_API__BASE_URL)
2. --config <path>     Explicit config file
3. ./empathy.toml      Project-level config
4. ~/.config/empathy-chat/config.toml   Global config

Example:
  empathy-chat
  empathy-chat --base-url https://chat.example.com
  empathy-chat -vv --config ./staging.toml
"#)]
pub struct Cli {
    /// Base URL of the chat service (overrides [api] base_url)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
