//! Create a node and reconcile it to a document

use crate::commands::{importer, node_at, open_graph, CommandResult};
use crate::config::CliConfig;
use clap::Args;
use statex_core::GraphStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Desired-state document (.json, .yaml or .yml)
    pub document: PathBuf,

    /// Path of the parent to create the node under (default: project root)
    #[arg(long, default_value = "")]
    pub parent: String,
}

pub async fn execute(args: ImportArgs, config: &CliConfig) -> CommandResult {
    let document = statex_store::parse_document_file(&args.document)?;
    let graph = open_graph(config)?;
    let parent = node_at(&graph, &args.parent).await?;

    let node = importer(&graph, config)
        .await?
        .import(&parent, &document)
        .await?;

    statex_store::save_graph(&config.graph, &graph)?;
    println!("Imported {}", graph.path(&node).await?);
    Ok(())
}
