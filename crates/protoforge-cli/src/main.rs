//! Command-line front end for the prototype forge
//!
//! Runs a script file (or stdin) in a fresh workspace and prints the report,
//! and exposes the tool registry so the `forge_and_run` binding can be
//! exercised exactly as a calling agent would invoke it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use protoforge_core::{
    config::{validate_config, ConfigLoader},
    ForgeConfig, PrototypeForge, ToolFactory, ToolRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
#[clap(name = "protoforge", author, version = "0.1.0", about = "Run prototype scripts in isolated, timestamped workspaces")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, help = "Path to a YAML configuration file")]
    config: Option<PathBuf>,

    #[clap(long, short, help = "Log level (defaults to the configured level)")]
    log_level: Option<String>,

    #[clap(long, help = "Override the workspace root directory")]
    root: Option<PathBuf>,

    #[clap(long, help = "Override the execution timeout in seconds")]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script in a new workspace and print the report
    Run {
        #[clap(long, short, help = "Short description used in the workspace name")]
        purpose: String,

        #[clap(help = "Script file to run; omit or use '-' to read from stdin")]
        file: Option<PathBuf>,

        #[clap(long, help = "Print the JSON report instead of the text summary")]
        json: bool,
    },
    /// List the available tools and their input schemas
    Tools,
    /// Invoke a tool with JSON arguments
    Call {
        #[clap(help = "Tool name, e.g. forge_and_run")]
        tool: String,

        #[clap(long, help = "Tool arguments as a JSON object")]
        args: String,
    },
    /// Show the effective configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref()).await?;
    if let Some(root) = &cli.root {
        config.workspace.root = root.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.execution.timeout_seconds = timeout;
    }
    validate_config(&config)?;

    // Initialize logger
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_level_filter = level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    match cli.command {
        Commands::Run { purpose, file, json } => run_script(&config, &purpose, file, json).await,
        Commands::Tools => {
            let registry = build_registry(&config)?;
            println!("{}", serde_json::to_string_pretty(&registry.list_tools())?);
            Ok(())
        }
        Commands::Call { tool, args } => {
            let arguments: serde_json::Value = serde_json::from_str(&args)
                .with_context(|| format!("Invalid JSON in --args: {}", args))?;
            let registry = build_registry(&config)?;
            let output = registry.call(&tool, arguments).await?;
            println!("{}", output);
            Ok(())
        }
        Commands::Info => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

fn build_registry(config: &ForgeConfig) -> Result<ToolRegistry> {
    let forge = Arc::new(PrototypeForge::new(config)?);
    Ok(ToolFactory::create_default_registry(forge))
}

async fn run_script(
    config: &ForgeConfig,
    purpose: &str,
    file: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let code = match file {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read script {}", path.display()))?,
        _ => {
            let mut code = String::new();
            tokio::io::stdin()
                .read_to_string(&mut code)
                .await
                .context("Failed to read script from stdin")?;
            code
        }
    };

    let forge = PrototypeForge::new(config)?;
    log::info!("Workspace root: {}", forge.workspaces().root().display());

    let report = forge.forge_and_run(&code, purpose).await?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.render_text());
    }
    Ok(())
}
