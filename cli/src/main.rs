//! CLI entrypoint for empathy-chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use empathy_application::{
    AuthenticateUseCase, ConversationController, CredentialSlot, KeyValueStore, SessionStore,
};
use empathy_domain::Severity;
use empathy_infrastructure::{
    ConfigLoader, FileConfig, FileKeyValueStore, HttpChatApi, JsonlConversationLogger,
    MemoryKeyValueStore, StorageKind, expand_home,
};
use empathy_presentation::{ChatRepl, Cli, ConsoleFormatter, ReplConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    apply_overrides(&mut config, &cli);

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;

    info!("Starting empathy-chat");

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Error => eprintln!("{}", ConsoleFormatter::error(&issue.message)),
            Severity::Warning => warn!("{}", issue.message),
        }
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Invalid configuration");
    }

    ConsoleFormatter::set_color(config.output.color);

    // === Dependency Injection ===
    let credential = CredentialSlot::new();
    let session = Arc::new(SessionStore::new(session_storage(&config)?, credential.clone()));
    let api = Arc::new(HttpChatApi::with_timeout(
        &config.api.base_url,
        config.api.timeout(),
        credential,
    )?);
    info!("Chat service: {}", api.base_url());

    let auth = AuthenticateUseCase::new(api.clone(), session);

    let mut conversation = ConversationController::new(api);
    if let Some(path) = config.logging.conversation_log.as_deref() {
        let path = expand_home(path);
        match JsonlConversationLogger::open(&path) {
            Ok(logger) => {
                info!("Writing transcript to {}", logger.path().display());
                conversation = conversation.with_conversation_logger(Arc::new(logger));
            }
            Err(e) => warn!("Transcript disabled, cannot open {}: {}", path.display(), e),
        }
    }

    let repl_config = ReplConfig {
        show_progress: config.repl.show_progress,
        history_file: config.repl.history_path(),
    };

    let mut repl = ChatRepl::new(auth, Arc::new(conversation)).with_config(repl_config);
    repl.run().await?;

    Ok(())
}

/// CLI flags win over every config source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(url) = &cli.base_url {
        config.api.base_url = url.clone();
    }
    if cli.quiet {
        config.repl.show_progress = false;
    }
    if cli.no_color {
        config.output.color = false;
    }
}

fn init_logging(verbose: u8, file: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(file) = file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let path = expand_home(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn session_storage(config: &FileConfig) -> Result<Arc<dyn KeyValueStore>> {
    let (kind, _) = config.session.parse_storage();
    match kind {
        StorageKind::Memory => Ok(Arc::new(MemoryKeyValueStore::new())),
        StorageKind::File => {
            let path = config
                .session
                .resolve_path()
                .ok_or_else(|| anyhow!("No path for file session storage"))?;
            info!("Persisting session in {}", path.display());
            Ok(Arc::new(FileKeyValueStore::new(path)))
        }
    }
}
