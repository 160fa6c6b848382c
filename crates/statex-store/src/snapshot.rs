//! Snapshot persistence
//!
//! A graph is stored as one pretty-printed JSON [`GraphSnapshot`]. Writes go
//! through a temp file in the same directory and a rename, so a reader never
//! observes a partially written snapshot.

use crate::errors::{io_error, snapshot_format, Result};
use statex_core::graph::{GraphSnapshot, MemoryGraph};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Atomically write bytes to a file
///
/// # Errors
///
/// `Io` if the parent directory, the temp file or the rename fails.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_snapshot_dir", e))?;
        }
    }

    let temp_path = target_path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| io_error("write_snapshot_temp", e))?;
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_snapshot_temp", e))?;

    Ok(())
}

/// # Errors
///
/// `Serialization` if the snapshot cannot be encoded, `Io` on write failure.
pub fn save_snapshot(path: &Path, snapshot: &GraphSnapshot) -> Result<()> {
    let path_str = path.display().to_string();
    let bytes = serde_json::to_vec_pretty(snapshot).map_err(|e| snapshot_format(&path_str, e))?;
    atomic_write(path, &bytes)?;
    debug!(path = %path_str, nodes = snapshot.nodes.len(), "snapshot saved");
    Ok(())
}

/// # Errors
///
/// `Io` if the file cannot be read, `Serialization` if it is not a snapshot.
pub fn load_snapshot(path: &Path) -> Result<GraphSnapshot> {
    let path_str = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| io_error("read_snapshot", e))?;
    let snapshot: GraphSnapshot =
        serde_json::from_slice(&bytes).map_err(|e| snapshot_format(&path_str, e))?;
    debug!(path = %path_str, nodes = snapshot.nodes.len(), "snapshot loaded");
    Ok(snapshot)
}

/// Persist the current state of `graph`
///
/// # Errors
///
/// As [`save_snapshot`], plus `Internal` if the graph lock is poisoned.
pub fn save_graph(path: &Path, graph: &MemoryGraph) -> Result<()> {
    let snapshot = graph.snapshot()?;
    save_snapshot(path, &snapshot)
}

/// Rebuild a graph from the snapshot at `path`
///
/// # Errors
///
/// As [`load_snapshot`], plus `NotFound` if the snapshot has no root node.
pub fn load_graph(path: &Path) -> Result<MemoryGraph> {
    let snapshot = load_snapshot(path)?;
    Ok(MemoryGraph::from_snapshot(snapshot)?)
}
