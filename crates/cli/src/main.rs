//! QA Agent CLI
//!
//! Main entry point for the `qa` command-line tool.
//! Builds a knowledge base from product documents and generates grounded
//! test cases and Selenium scripts from it.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{BuildCommand, ResetCommand, RetrieveCommand, ScriptCommand, TestCasesCommand};
use qa_core::{config::AppConfig, logging};
use std::path::PathBuf;
use std::process::ExitCode;

/// QA Agent - grounded test cases and Selenium scripts from product docs
#[derive(Parser, Debug)]
#[command(name = "qa")]
#[command(about = "Grounded test-case and Selenium script generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "QA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: <workspace>/.qa/config.yaml)
    #[arg(short, long, global = true, env = "QA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation backend base URL
    #[arg(long, global = true, env = "OLLAMA_URL")]
    endpoint: Option<String>,

    /// Generation model name
    #[arg(short, long, global = true, env = "OLLAMA_MODEL")]
    model: Option<String>,

    /// Skip the generation backend and use the canned responses
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest documents and an optional page under test
    Build(BuildCommand),

    /// Show the chunks most relevant to a query
    Retrieve(RetrieveCommand),

    /// Generate test cases grounded in the knowledge base
    TestCases(TestCasesCommand),

    /// Generate a Selenium script for one test case
    Script(ScriptCommand),

    /// Clear the knowledge base
    Reset(ResetCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Build(_) => "build",
            Commands::Retrieve(_) => "retrieve",
            Commands::TestCases(_) => "test-cases",
            Commands::Script(_) => "script",
            Commands::Reset(_) => "reset",
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Workspace and config file decide which YAML is merged, so they are
    // applied before loading.
    let workspace = cli.workspace.clone();
    let config_file = cli.config.clone();
    let config = AppConfig::load_with(|key| match key {
        "QA_WORKSPACE" => workspace
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| std::env::var(key).ok()),
        "QA_CONFIG" => config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })
    .context("Failed to load configuration")?;

    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.endpoint,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.offline,
    );
    config.validate().context("Invalid configuration")?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("QA Agent CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Generation: {} {} ({})",
        config.generation.provider,
        config.generation.endpoint,
        config.generation.model
    );

    config.ensure_qa_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Build(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::TestCases(cmd) => cmd.execute(&config).await,
        Commands::Script(cmd) => cmd.execute(&config).await,
        Commands::Reset(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    Ok(result?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
