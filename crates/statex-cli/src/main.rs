//! statex CLI
//!
//! Reconciles a snapshot-backed graph against declarative state documents

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "statex")]
#[command(about = "statex - Declarative state reconciliation for object graphs", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./statex.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Graph snapshot file; overrides the configured one
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an empty graph snapshot
    Init(commands::init::InitArgs),
    /// Reconcile an existing node to a document
    Apply(commands::apply::ApplyArgs),
    /// Create a node under a parent and reconcile it to a document
    Import(commands::import::ImportArgs),
    /// Print the canonical document of a node
    Export(commands::export::ExportArgs),
    /// Print the changes applying a document would make to a node
    Diff(commands::diff::DiffArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match config::CliConfig::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(graph) = cli.graph {
                config.graph = graph;
            }
            statex_core::logging_facility::init(config.log_profile);

            match cli.command {
                Commands::Init(args) => commands::init::execute(args, &config),
                Commands::Apply(args) => commands::apply::execute(args, &config).await,
                Commands::Import(args) => commands::import::execute(args, &config).await,
                Commands::Export(args) => commands::export::execute(args, &config).await,
                Commands::Diff(args) => commands::diff::execute(args, &config).await,
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
