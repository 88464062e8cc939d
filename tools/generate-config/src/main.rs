//! Environment file generator for IRIS
//!
//! Writes a `.env` file containing every setting the chat client reads,
//! with the chosen values filled in and the rest at their defaults.

use clap::{Parser, ValueEnum};
use iris_core::config::{DEFAULT_API_BASE_PATH, DEFAULT_API_URL, DEFAULT_APP_ICON, DEFAULT_APP_TITLE};
use iris_core::{all_roles, is_known_role};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output file path
    #[arg(short, long, default_value = ".env")]
    output: PathBuf,

    /// Force overwrite if file exists
    #[arg(short, long)]
    force: bool,

    /// Chat service base URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Path segment under the base URL
    #[arg(long, default_value = DEFAULT_API_BASE_PATH)]
    api_base_path: String,

    /// Chat view layout
    #[arg(short, long, value_enum, default_value = "wide")]
    layout: LayoutArg,

    /// Role selected at start-up
    #[arg(short, long, default_value = "admin")]
    role: String,

    /// Keep the transcript when the role changes
    #[arg(long)]
    keep_history_on_role_change: bool,

    /// Disable rotating log files
    #[arg(long)]
    no_file_logging: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// Full terminal width
    Wide,
    /// Narrow centered column
    Centered,
}

impl LayoutArg {
    fn as_str(self) -> &'static str {
        match self {
            LayoutArg::Wide => "wide",
            LayoutArg::Centered => "centered",
        }
    }
}

/// Escape a value for use inside double quotes
fn quote(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
}

fn generate_env_content(cli: &Cli) -> String {
    format!(
        "# ========================================\n\
         # IRIS - Environment Configuration\n\
         # ========================================\n\
         # Generated: {}\n\
         \n\
         # Chat service\n\
         API_URL=\"{}\"\n\
         API_BASE_PATH=\"{}\"\n\
         HEALTH_TIMEOUT_SECS=5\n\
         REQUEST_TIMEOUT_SECS=30\n\
         \n\
         # Display\n\
         APP_TITLE=\"{}\"\n\
         APP_ICON=\"{}\"\n\
         # wide | centered\n\
         APP_LAYOUT={}\n\
         \n\
         # Session\n\
         DEFAULT_ROLE=\"{}\"\n\
         RESET_ON_ROLE_CHANGE={}\n\
         \n\
         # Logging\n\
         LOG_LEVEL=DEBUG\n\
         CONSOLE_LOGGING=true\n\
         FILE_LOGGING={}\n\
         LOG_DIR=\"logs\"\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        quote(&cli.api_url),
        quote(&cli.api_base_path),
        quote(DEFAULT_APP_TITLE),
        quote(DEFAULT_APP_ICON),
        cli.layout.as_str(),
        quote(&cli.role),
        !cli.keep_history_on_role_change,
        !cli.no_file_logging,
    )
}

fn main() {
    let cli = Cli::parse();

    if cli.output.exists() && !cli.force {
        eprintln!("❌ Error: File {:?} already exists!", cli.output);
        eprintln!("   Use --force to overwrite");
        std::process::exit(1);
    }

    if !is_known_role(&cli.role) {
        eprintln!("❌ Error: Unknown role '{}'", cli.role);
        let ids: Vec<&str> = all_roles().iter().map(|r| r.id).collect();
        eprintln!("   Known roles: {}", ids.join(", "));
        std::process::exit(1);
    }

    println!("📄 IRIS Configuration Generator");
    println!();

    let content = generate_env_content(&cli);
    match fs::write(&cli.output, content) {
        Ok(_) => {
            println!("✓ Configuration written to: {:?}", cli.output);
        }
        Err(e) => {
            eprintln!("❌ Failed to write file: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("📋 Next Steps:");
    println!("   1. Check API_URL in {:?} points at your chat service", cli.output);
    println!("   2. Run: cargo run --bin run-chat-ui");
    println!();
}
