//! Thin collaborator boundary around the `git` binary. Every call shells out
//! through [`crate::process::run_capture`] and parses machine-readable output;
//! nothing here touches the object store directly.

use crate::constants::HEAD_SHORT_CHARS;
use crate::error::{Error, Result};
use crate::process::{run_capture, CmdOutput};
use std::path::{Path, PathBuf};

pub(crate) struct GitOutput {
    pub(crate) command: String,
    pub(crate) exit_code: i32,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl GitOutput {
    pub(crate) fn ok(&self) -> bool {
        self.exit_code == 0
    }

    /// Promote a non-zero exit into the error kind that surfaces git's own
    /// stdout/stderr verbatim.
    pub(crate) fn into_failure(self) -> Error {
        Error::Git {
            command: self.command,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}

pub(crate) fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<GitOutput> {
    let output: CmdOutput = run_capture("git", args, cwd)?;
    Ok(GitOutput {
        command: format!("git {}", args.join(" ")),
        exit_code: output.exit_code(),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Top-level directory of the repository containing `cwd` (or the process
/// working directory). Fails with `NotARepository` outside a git tree.
pub(crate) fn repo_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let output = run_git(&["rev-parse", "--show-toplevel"], cwd)?;
    if !output.ok() {
        return Err(Error::NotARepository);
    }
    let root = output.stdout.trim();
    if root.is_empty() {
        return Err(Error::NotARepository);
    }
    Ok(PathBuf::from(root))
}

/// `git check-ref-format --branch` as the authority on branch validity; the
/// validator's own message is surfaced on rejection.
pub(crate) fn check_branch_format(repo_root: &Path, branch: &str) -> Result<()> {
    let output = run_git(&["check-ref-format", "--branch", branch], Some(repo_root))?;
    if output.ok() {
        Ok(())
    } else {
        Err(output.into_failure())
    }
}

/// Whether `refs/heads/<branch>` exists. `show-ref` exits 1 for a missing
/// ref; anything above that is a real failure.
pub(crate) fn branch_exists(repo_root: &Path, branch: &str) -> Result<bool> {
    let ref_name = format!("refs/heads/{branch}");
    let output = run_git(
        &["show-ref", "--verify", "--quiet", &ref_name],
        Some(repo_root),
    )?;
    if output.ok() {
        return Ok(true);
    }
    if output.exit_code > 1 {
        return Err(output.into_failure());
    }
    Ok(false)
}

pub(crate) fn current_branch(worktree_path: &Path) -> Result<String> {
    let output = run_git(&["rev-parse", "--abbrev-ref", "HEAD"], Some(worktree_path))?;
    if !output.ok() {
        return Err(output.into_failure());
    }
    Ok(output.stdout.trim().to_string())
}

pub(crate) fn status_porcelain(worktree_path: &Path) -> Result<String> {
    let output = run_git(&["status", "--porcelain"], Some(worktree_path))?;
    if !output.ok() {
        return Err(output.into_failure());
    }
    Ok(output.stdout)
}

/// One linked (or main) worktree as reported by
/// `git worktree list --porcelain`. Parsed fresh on every query; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorktreeRecord {
    pub(crate) path: PathBuf,
    pub(crate) branch: Option<String>,
    pub(crate) head: String,
    pub(crate) locked: bool,
    pub(crate) prunable: bool,
    pub(crate) detached: bool,
}

impl WorktreeRecord {
    pub(crate) fn branch_label(&self) -> String {
        match &self.branch {
            Some(branch) => branch.clone(),
            None if self.detached => "(detached)".to_string(),
            None => "-".to_string(),
        }
    }

    pub(crate) fn head_short(&self) -> String {
        if self.head.is_empty() {
            "-".to_string()
        } else {
            self.head.chars().take(HEAD_SHORT_CHARS).collect()
        }
    }
}

pub(crate) fn list_worktrees(repo_root: &Path) -> Result<Vec<WorktreeRecord>> {
    let output = run_git(&["worktree", "list", "--porcelain"], Some(repo_root))?;
    if !output.ok() {
        return Err(output.into_failure());
    }
    Ok(parse_worktree_porcelain(&output.stdout))
}

pub(crate) fn parse_worktree_porcelain(raw: &str) -> Vec<WorktreeRecord> {
    let mut records = Vec::new();
    let mut current: Option<WorktreeRecord> = None;

    for line in raw.lines() {
        if line.is_empty() {
            if let Some(record) = current.take() {
                records.push(record);
            }
            continue;
        }

        if let Some(value) = line.strip_prefix("worktree ") {
            if let Some(record) = current.take() {
                records.push(record);
            }
            current = Some(WorktreeRecord {
                path: PathBuf::from(value.trim()),
                branch: None,
                head: String::new(),
                locked: false,
                prunable: false,
                detached: false,
            });
            continue;
        }

        let Some(record) = current.as_mut() else {
            continue;
        };

        if let Some(value) = line.strip_prefix("HEAD ") {
            record.head = value.trim().to_string();
        } else if let Some(value) = line.strip_prefix("branch ") {
            let value = value.trim();
            record.branch = Some(
                value
                    .strip_prefix("refs/heads/")
                    .unwrap_or(value)
                    .to_string(),
            );
        } else if line == "locked" || line.starts_with("locked ") {
            record.locked = true;
        } else if line == "prunable" || line.starts_with("prunable ") {
            record.prunable = true;
        } else if line == "detached" {
            record.detached = true;
        }
    }

    if let Some(record) = current.take() {
        records.push(record);
    }
    records
}
