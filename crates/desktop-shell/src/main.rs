//! Expense tracker desktop shell - sign-in, session status and logout.

mod app;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use output::OutputFormat;
use tracker_config_and_utils::{init_logging, Config, Paths};

/// Expense tracker desktop shell command-line interface.
#[derive(Parser)]
#[command(name = "expense-tracker-desktop")]
#[command(about = "Expense tracker desktop shell for sign-in and session management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for local state (config, session, logs). Defaults to ~/.expense-tracker
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the stored session and print the auth status
    Status,
    /// Sign in with Google through the system browser
    Login {
        /// Seconds to wait for the browser redirect
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// End the session and clear the stored credential
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(&config, &paths);

    let shell = app::start_shell(config, paths)?;

    let result = match cli.command {
        Commands::Status => app::status(&shell)
            .await
            .map(|view| output::print(&view, &cli.format)),
        Commands::Login { timeout_secs } => app::login(&shell, timeout_secs)
            .await
            .map(|outcome| output::print(&outcome, &cli.format)),
        Commands::Logout => app::logout(&shell)
            .await
            .map(|()| output::print_success("Logged out", &cli.format)),
    };

    shell.shutdown().await;

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e), &cli.format);
        std::process::exit(1);
    }

    Ok(())
}
