//! Create an empty graph snapshot

use crate::commands::CommandResult;
use crate::config::CliConfig;
use clap::Args;
use statex_core::MemoryGraph;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Replace an existing snapshot
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: InitArgs, config: &CliConfig) -> CommandResult {
    if config.graph.exists() && !args.force {
        return Err(format!(
            "Graph {} already exists (use --force to replace it)",
            config.graph.display()
        )
        .into());
    }

    statex_store::save_graph(&config.graph, &MemoryGraph::new())?;
    println!("Initialized graph at {}", config.graph.display());
    Ok(())
}
