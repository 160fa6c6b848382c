//! Reconcile an existing node to a document

use crate::commands::{importer, node_at, open_graph, CommandResult};
use crate::config::CliConfig;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Desired-state document (.json, .yaml or .yml)
    pub document: PathBuf,

    /// Path of the node to reconcile (default: project root)
    #[arg(long, default_value = "")]
    pub path: String,
}

pub async fn execute(args: ApplyArgs, config: &CliConfig) -> CommandResult {
    let document = statex_store::parse_document_file(&args.document)?;
    let graph = open_graph(config)?;
    let node = node_at(&graph, &args.path).await?;

    importer(&graph, config).await?.apply(&node, &document).await?;

    let mutations = graph.take_journal()?.len();
    statex_store::save_graph(&config.graph, &graph)?;
    info!(graph = %config.graph.display(), mutations, "graph saved");
    println!("Applied {} mutation(s) to {:?}", mutations, args.path);
    Ok(())
}
