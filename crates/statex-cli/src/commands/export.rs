//! Print the canonical document of a node

use crate::commands::{importer, node_at, open_graph, CommandResult};
use crate::config::CliConfig;
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Path of the node to export (default: project root)
    #[arg(long, default_value = "")]
    pub path: String,

    /// Omit children
    #[arg(long)]
    pub shallow: bool,

    #[arg(long, value_enum, default_value = "json")]
    pub format: ExportFormat,
}

pub async fn execute(args: ExportArgs, config: &CliConfig) -> CommandResult {
    let graph = open_graph(config)?;
    let node = node_at(&graph, &args.path).await?;

    let document = importer(&graph, config)
        .await?
        .serialize(&node, args.shallow)
        .await?;

    match args.format {
        ExportFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
        ExportFormat::Yaml => print!("{}", serde_yaml::to_string(&document)?),
    }
    Ok(())
}
