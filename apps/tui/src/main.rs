//! PrepAgent TUI: knowledge base, study planner and interview agent in the terminal.
//!
//! Built with `ratatui` + `crossterm`. Model calls run on tokio tasks and
//! report back to the event loop over an mpsc channel.

mod app;
mod event;
mod screens;
mod widgets;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use prepagent_core::assistant::Assistant;
use prepagent_gemini::GeminiClient;
use prepagent_shared::{config_dir, init_config, load_config, load_config_from};

/// PrepAgent: turn your notes into a study plan and rehearse the interview.
#[derive(Debug, Parser)]
#[command(name = "prepagent", version, about)]
pub(crate) struct Cli {
    /// Path to a config file (defaults to ~/.prepagent/prepagent.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Log file (defaults to ~/.prepagent/prepagent.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if cli.init_config {
        let path = init_config(cli.config.as_deref())?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => config_dir()?.join("prepagent.log"),
    };
    init_tracing(&cli, &log_path)?;

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    tracing::info!(
        plan_model = %config.plan.model,
        chat_model = %config.chat.model,
        web_search = config.chat.web_search,
        "starting prepagent"
    );

    let client = GeminiClient::from_config(&config).wrap_err("could not set up the Gemini client")?;
    let assistant = Assistant::new(config, Arc::new(client));

    app::run(assistant).await
}

/// Initialize tracing into `log_path`; the terminal belongs to the UI.
fn init_tracing(cli: &Cli, log_path: &Path) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prepagent=info",
        1 => "prepagent=debug",
        _ => "prepagent=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("could not create log directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .wrap_err_with(|| format!("could not open log file {}", log_path.display()))?;
    let writer = Mutex::new(file);

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .init();
        }
    }

    Ok(())
}
