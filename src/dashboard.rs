//! Reconciled view over stored mappings: each row is cross-checked against
//! live git and the session host, and every sub-lookup failure degrades into
//! a note with the stored values as best-effort substitutes.

use crate::error::Result;
use crate::format::render_table;
use crate::git;
use crate::process::first_line;
use crate::session::SessionApi;
use crate::state::SessionStore;
use crate::worktree::worktree_status;
use std::path::Path;

pub(crate) fn dashboard_report(api: &dyn SessionApi, store: &SessionStore) -> Result<String> {
    let state = store.read()?;
    if state.entries.is_empty() {
        return Ok([
            "No worktree sessions recorded.",
            "Hint: run `start` or `fork` to create a mapping.",
        ]
        .join("\n"));
    }

    let mut rows = Vec::new();
    let mut notes = Vec::new();

    for entry in &state.entries {
        let path = Path::new(&entry.worktree_path);
        let fallback_updated = entry.created_at.clone();

        if !path.exists() {
            rows.push(vec![
                entry.branch.clone(),
                entry.branch.clone(),
                entry.worktree_path.clone(),
                entry.session_id.clone(),
                "missing".to_string(),
                fallback_updated,
            ]);
            notes.push(format!("{}: missing on disk", entry.worktree_path));
            continue;
        }

        let branch = match git::current_branch(path) {
            Ok(name) if name == "HEAD" => "(detached)".to_string(),
            Ok(name) if !name.is_empty() => name,
            Ok(_) => entry.branch.clone(),
            Err(err) => {
                notes.push(format!(
                    "{}: {}",
                    entry.worktree_path,
                    first_line(&err.to_string())
                ));
                entry.branch.clone()
            }
        };

        let dirty = match worktree_status(path) {
            Ok(summary) => {
                if summary.clean {
                    "clean".to_string()
                } else {
                    "dirty".to_string()
                }
            }
            Err(err) => {
                notes.push(format!(
                    "{}: {}",
                    entry.worktree_path,
                    first_line(&err.to_string())
                ));
                "error".to_string()
            }
        };

        let updated_at = match api.updated_at(&entry.session_id) {
            Ok(Some(at)) => at,
            Ok(None) => fallback_updated,
            Err(err) => {
                notes.push(format!(
                    "Session {}: {}",
                    entry.session_id,
                    first_line(&err.to_string())
                ));
                fallback_updated
            }
        };

        rows.push(vec![
            entry.branch.clone(),
            branch,
            entry.worktree_path.clone(),
            entry.session_id.clone(),
            dirty,
            updated_at,
        ]);
    }

    let table = render_table(
        &["task/name", "branch", "worktreePath", "sessionID", "dirty?", "updatedAt"],
        &rows,
    );

    let mut sections = vec![
        format!("Worktree dashboard ({}):\n{table}", rows.len()),
        format!("State: {}", store.path().display()),
    ];
    if !notes.is_empty() {
        sections.push(format!(
            "Notes:\n{}",
            notes
                .iter()
                .map(|note| format!("- {note}"))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }

    Ok(sections.join("\n\n"))
}
