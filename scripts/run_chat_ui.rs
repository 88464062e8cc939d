use anyhow::Context;
use clap::Parser;
use iris_adaptor_terminal::{TerminalChat, TerminalConfig};
use iris_core::{init_logging, load_env, load_env_from_path, parse_log_level, ChatService, SessionState, Settings};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Chat with the IRIS knowledge assistant", long_about = None)]
struct Cli {
    /// Environment file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Log level (overrides LOG_LEVEL from the .env file)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Role to start with (overrides DEFAULT_ROLE from the .env file)
    #[arg(long, env = "DEFAULT_ROLE")]
    role: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let env_file = match &cli.env_file {
        Some(path) => {
            load_env_from_path(path)?;
            Some(path.clone())
        }
        None => load_env()?,
    };

    let mut settings = Settings::from_env().context("invalid configuration")?;
    if let Some(level) = &cli.log_level {
        settings.log.level = parse_log_level(level)?;
    }
    if let Some(role) = cli.role {
        settings.chat.default_role = role;
    }

    let _log_guards = init_logging(&settings.log)?;
    match &env_file {
        Some(path) => tracing::info!(target: "app", "Loaded environment from: {}", path.display()),
        None => tracing::debug!(
            target: "app",
            "No .env file found - using system environment variables only"
        ),
    }
    tracing::info!(
        target: "app",
        "Starting {} against {}",
        settings.app.title,
        settings.api.endpoints.chat
    );

    let service = ChatService::new(&settings.api)?;
    let session = SessionState::new(&settings.chat)?;
    let config = TerminalConfig {
        app: settings.app.clone(),
        ansi: std::io::stdout().is_terminal(),
    };

    let mut chat = TerminalChat::new(config, Arc::new(service), session);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    chat.run(stdin, &mut stdout).await?;
    Ok(())
}
