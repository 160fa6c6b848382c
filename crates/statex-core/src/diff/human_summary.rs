//! Human-readable rendering of change lists.

use crate::model::{ChangeKind, ChangeRecord};

/// Render one line per change: `+ key = value` for puts, `- key` for deletes.
///
/// Informational only; used by the CLI `diff` command.
pub fn render_human_summary(changes: &[ChangeRecord]) -> String {
    if changes.is_empty() {
        return "No changes.\n".to_string();
    }

    let mut out = String::new();
    for change in changes {
        match change.kind {
            ChangeKind::Put => out.push_str(&format!(
                "+ {} = {}\n",
                change.key_string(),
                change.value_or_null()
            )),
            ChangeKind::Delete => out.push_str(&format!("- {}\n", change.key_string())),
        }
    }
    out.push_str(&format!("\n{} change(s)\n", changes.len()));
    out
}
