//! Preview the changes a document would make to one node

use crate::commands::{importer, node_at, open_graph, CommandResult};
use crate::config::CliConfig;
use clap::Args;
use statex_core::diff::render_human_summary;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Desired-state document (.json, .yaml or .yml)
    pub document: PathBuf,

    /// Path of the node to compare against (default: project root)
    #[arg(long, default_value = "")]
    pub path: String,
}

pub async fn execute(args: DiffArgs, config: &CliConfig) -> CommandResult {
    let document = statex_store::parse_document_file(&args.document)?;
    let graph = open_graph(config)?;
    let node = node_at(&graph, &args.path).await?;

    let changes = importer(&graph, config).await?.plan(&node, &document).await?;

    print!("{}", render_human_summary(&changes));
    Ok(())
}
