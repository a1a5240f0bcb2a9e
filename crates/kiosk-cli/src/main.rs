mod cmd;
mod host;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::session::SessionSubcommand;
use kiosk_core::config::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kiosk",
    about = "Proctoring kiosk client: keep this device in step with the exam server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Kiosk install root holding data/ (default: auto-detect from cwd)
    #[arg(long, global = true, env = "KIOSK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the handshake loop until the server or the operator ends it
    Run,

    /// Perform a single handshake and print the server's directive
    Handshake,

    /// Inspect or clear the persisted session document
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },

    /// Show the resolved timer table
    Timers,
}

fn main() {
    let cli = Cli::parse();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let default_level = match &cli.command {
        Commands::Run => Settings::load(&root)
            .map(|s| s.debug.mode.level())
            .unwrap_or(tracing::Level::WARN),
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Run => cmd::run::run(&root),
        Commands::Handshake => cmd::handshake::run(&root, cli.json),
        Commands::Session { subcommand } => cmd::session::run(&root, subcommand, cli.json),
        Commands::Timers => cmd::timers::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
