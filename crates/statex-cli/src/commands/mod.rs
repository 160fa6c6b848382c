pub mod apply;
pub mod diff;
pub mod export;
pub mod import;
pub mod init;

use crate::config::CliConfig;
use statex_core::{GraphStore, Importer, MemoryGraph, MemoryNode};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the configured graph snapshot
pub fn open_graph(config: &CliConfig) -> Result<MemoryGraph, Box<dyn std::error::Error>> {
    if !config.graph.exists() {
        return Err(format!(
            "Graph {} does not exist; run `statex init` first",
            config.graph.display()
        )
        .into());
    }
    Ok(statex_store::load_graph(&config.graph)?)
}

/// Node at `path`; the empty path is the project root
pub async fn node_at(graph: &MemoryGraph, path: &str) -> Result<MemoryNode, Box<dyn std::error::Error>> {
    graph
        .load_by_path(path)
        .await?
        .ok_or_else(|| format!("No node at path {:?}", path).into())
}

pub async fn importer<'a>(
    graph: &'a MemoryGraph,
    config: &CliConfig,
) -> Result<Importer<'a, MemoryGraph>, Box<dyn std::error::Error>> {
    Ok(Importer::with_config(graph, config.importer.clone()).await?)
}
