//! Start/fork/swarm orchestration: worktree + external session + persisted
//! mapping. Once the worktree exists, later failures downgrade to
//! partial-success reports that still surface the worktree path and branch;
//! the worktree is never rolled back automatically.

use crate::constants::SESSION_TITLE_PREFIX;
use crate::error::{Error, Result};
use crate::git::branch_exists;
use crate::paths::{default_worktree_path, normalize_branch_name};
use crate::process::{best_error_line, first_line};
use crate::session::SessionApi;
use crate::state::{SessionMappingEntry, SessionStore};
use crate::worktree::{create_worktree, CreateDetails, CreateOptions};
use chrono::{SecondsFormat, Utc};
use std::path::Path;

pub(crate) struct SessionFlowOptions {
    pub(crate) create: CreateOptions,
    pub(crate) open_sessions: bool,
}

fn session_title(branch: &str) -> String {
    format!("{SESSION_TITLE_PREFIX}{branch}")
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn mapping_entry(details: &CreateDetails, session_id: &str) -> SessionMappingEntry {
    SessionMappingEntry {
        worktree_path: details.worktree_path.display().to_string(),
        branch: details.branch.clone(),
        session_id: session_id.to_string(),
        created_at: now_iso(),
    }
}

/// Partial-success text for a failure that happened after the worktree was
/// created: the worktree survives, so its coordinates must too.
fn partial_failure(details: &CreateDetails, error: &Error, extra: &[String]) -> String {
    let mut lines = vec![
        format!("Error: {error}"),
        format!("Worktree was created and is kept: {}", details.worktree_path.display()),
        format!("Branch: {}", details.branch),
    ];
    lines.extend(extra.iter().cloned());
    lines.join("\n")
}

fn next_steps(session_id: &str, open_requested: bool, open_failed: bool) -> String {
    let open_label = if open_requested {
        if open_failed {
            "retry with --open-sessions (or run /sessions)"
        } else {
            "already opened"
        }
    } else {
        "pass --open-sessions (or run /sessions)"
    };
    [
        "Next steps:".to_string(),
        format!("- Open sessions UI: {open_label}"),
        format!("- Select session {session_id}"),
    ]
    .join("\n")
}

struct SessionReport<'a> {
    details: &'a CreateDetails,
    session_id: &'a str,
    title: &'a str,
    state_path: String,
    notes: Vec<String>,
    open_requested: bool,
    open_failed: bool,
}

fn render_session_report(report: SessionReport<'_>) -> String {
    let mut lines = vec![
        "Worktree session created.".to_string(),
        format!("Branch: {}", report.details.branch),
        format!("Worktree: {}", report.details.worktree_path.display()),
        format!("Session: {}", report.session_id),
        format!("Title: {}", report.title),
        format!("Command: {}", report.details.command),
        format!("State: {}", report.state_path),
    ];
    if !report.notes.is_empty() {
        lines.push(format!(
            "Notes:\n{}",
            report
                .notes
                .iter()
                .map(|note| format!("- {note}"))
                .collect::<Vec<_>>()
                .join("\n")
        ));
    }
    lines.push(next_steps(
        report.session_id,
        report.open_requested,
        report.open_failed,
    ));
    lines.join("\n")
}

/// Create a worktree and start a fresh session in it.
pub(crate) fn start_session(
    repo_root: &Path,
    default_base: &str,
    api: &dyn SessionApi,
    store: &SessionStore,
    options: &SessionFlowOptions,
) -> Result<String> {
    let details = create_worktree(repo_root, default_base, &options.create)?;
    let title = session_title(&details.branch);

    let session_id = match api.create(&details.worktree_path, &title) {
        Ok(id) => id,
        Err(err) => return Ok(partial_failure(&details, &err, &[])),
    };

    finish_flow(api, store, &details, &session_id, &title, Vec::new(), options)
}

/// Create a worktree and fork the current session into it. The caller passes
/// the current session id explicitly; there is no ambient context.
pub(crate) fn fork_session(
    repo_root: &Path,
    default_base: &str,
    api: &dyn SessionApi,
    store: &SessionStore,
    current_session: Option<&str>,
    options: &SessionFlowOptions,
) -> Result<String> {
    let current = current_session
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(Error::MissingSessionContext)?;

    let details = create_worktree(repo_root, default_base, &options.create)?;
    let title = session_title(&details.branch);

    let session_id = match api.fork(current, &details.worktree_path) {
        Ok(id) => id,
        Err(err) => return Ok(partial_failure(&details, &err, &[])),
    };

    let mut notes = Vec::new();
    if let Err(err) = api.update_title(&session_id, &title) {
        notes.push(format!("Session title update failed: {}", first_line(&err.to_string())));
    }

    finish_flow(api, store, &details, &session_id, &title, notes, options)
}

fn finish_flow(
    api: &dyn SessionApi,
    store: &SessionStore,
    details: &CreateDetails,
    session_id: &str,
    title: &str,
    mut notes: Vec<String>,
    options: &SessionFlowOptions,
) -> Result<String> {
    let state_path = match store.append(mapping_entry(details, session_id)) {
        Ok(path) => path.display().to_string(),
        Err(err) => {
            let extra = vec![format!("Session: {session_id}")];
            return Ok(partial_failure(details, &err, &extra));
        }
    };

    let open_requested = options.open_sessions;
    let mut open_failed = false;
    if open_requested {
        if let Err(err) = api.open_sessions_ui() {
            open_failed = true;
            notes.push(format!("Open sessions failed: {}", first_line(&err.to_string())));
        }
    }

    Ok(render_session_report(SessionReport {
        details,
        session_id,
        title,
        state_path,
        notes,
        open_requested,
        open_failed,
    }))
}

pub(crate) struct SwarmOptions {
    pub(crate) tasks: Vec<String>,
    pub(crate) prefix: Option<String>,
    pub(crate) open_sessions: bool,
    pub(crate) force: bool,
}

/// Batch variant of fork: one worktree plus forked session per task. Tasks
/// are processed in order; a failing task is noted and the rest continue.
pub(crate) fn swarm_sessions(
    repo_root: &Path,
    default_base: &str,
    default_prefix: &str,
    api: &dyn SessionApi,
    store: &SessionStore,
    current_session: Option<&str>,
    options: &SwarmOptions,
) -> Result<String> {
    let current = current_session
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(Error::MissingSessionContext)?;

    if options.tasks.is_empty() {
        return Err(Error::validation("at least one task is required"));
    }
    let prefix = options
        .prefix
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default_prefix);

    let mut created = Vec::new();
    let mut skipped = Vec::new();
    let mut failures = Vec::new();
    let mut notes = Vec::new();

    for task in &options.tasks {
        let slug = normalize_branch_name(task);
        if slug.is_empty() {
            failures.push(format!("{task}: cannot derive a branch name"));
            continue;
        }
        let branch = format!("{prefix}{slug}");

        if !options.force {
            match precheck_task(repo_root, &branch) {
                Ok(Some(reason)) => {
                    skipped.push(format!("{task}: {reason}"));
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    failures.push(format!("{task}: {}", task_error_text(&err)));
                    continue;
                }
            }
        }

        let create = CreateOptions {
            name: task.clone(),
            branch: Some(branch.clone()),
            base: None,
            path: None,
        };
        let details = match create_worktree(repo_root, default_base, &create) {
            Ok(details) => details,
            Err(err) => {
                failures.push(format!("{task}: {}", task_error_text(&err)));
                continue;
            }
        };

        let session_id = match api.fork(current, &details.worktree_path) {
            Ok(id) => id,
            Err(err) => {
                failures.push(format!(
                    "{task}: worktree kept at {}, but {}",
                    details.worktree_path.display(),
                    task_error_text(&err)
                ));
                continue;
            }
        };

        // Title update is cosmetic; a failure never demotes the task.
        let title = session_title(&details.branch);
        if let Err(err) = api.update_title(&session_id, &title) {
            notes.push(format!(
                "{task}: title update failed: {}",
                first_line(&err.to_string())
            ));
        }
        match store.append(mapping_entry(&details, &session_id)) {
            Ok(_) => created.push(format!(
                "{task}: {branch} -> {} (session {session_id})",
                details.worktree_path.display()
            )),
            Err(err) => failures.push(format!(
                "{task}: session {session_id} created, but {err}"
            )),
        }
    }

    if options.open_sessions && !created.is_empty() {
        if let Err(err) = api.open_sessions_ui() {
            notes.push(format!("Open sessions failed: {}", first_line(&err.to_string())));
        }
    }

    let mut sections = vec![format!(
        "Swarm complete: {} created, {} skipped, {} failed.",
        created.len(),
        skipped.len(),
        failures.len()
    )];
    if !created.is_empty() {
        sections.push(format!("Created:\n{}", bullet_list(&created)));
    }
    if !skipped.is_empty() {
        sections.push(format!("Skipped:\n{}", bullet_list(&skipped)));
    }
    if !failures.is_empty() {
        sections.push(format!("Failed:\n{}", bullet_list(&failures)));
    }
    if !notes.is_empty() {
        sections.push(format!("Notes:\n{}", bullet_list(&notes)));
    }
    sections.push(format!("State: {}", store.path().display()));

    Ok(sections.join("\n\n"))
}

/// Per-task failure line. Git failures carry their own stderr, which the
/// batch report would otherwise drop.
fn task_error_text(err: &Error) -> String {
    match err {
        Error::Git { stdout, stderr, .. } => {
            let line = if stderr.trim().is_empty() {
                first_line(stdout)
            } else {
                best_error_line(stderr)
            };
            format!("{err}: {line}")
        }
        other => other.to_string(),
    }
}

/// Without `--force`, tasks whose branch or default path already exists are
/// skipped rather than half-created.
fn precheck_task(repo_root: &Path, branch: &str) -> Result<Option<String>> {
    if branch_exists(repo_root, branch)? {
        return Ok(Some(format!("branch `{branch}` already exists")));
    }
    let path = default_worktree_path(repo_root, branch);
    if path.exists() {
        return Ok(Some(format!("path {} already exists", path.display())));
    }
    Ok(None)
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Host event hook: a deleted session drops all of its mappings. Pure
/// function of the id and the state file; how the notification arrives is
/// the host's concern.
pub(crate) fn handle_session_deleted(store: &SessionStore, session_id: &str) -> Result<usize> {
    let id = session_id.trim();
    if id.is_empty() {
        return Ok(0);
    }
    store.remove_by_session(id)
}
