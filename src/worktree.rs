//! Worktree lifecycle: guarded create/remove/prune and porcelain-backed
//! matching. All git access goes through [`crate::git`].

use crate::error::{Error, Result};
use crate::format::format_command;
use crate::git::{
    branch_exists, check_branch_format, list_worktrees, run_git, WorktreeRecord,
};
use crate::paths::{default_worktree_path, normalize_branch_name, paths_equal, resolve_worktree_path};
use crate::status::summarize_porcelain;
use crate::{git, status};
use std::fs;
use std::path::{Path, PathBuf};

fn git_command(args: &[&str]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push("git");
    parts.extend_from_slice(args);
    format_command(&parts)
}

#[derive(Debug, Default, Clone)]
pub(crate) struct CreateOptions {
    pub(crate) name: String,
    pub(crate) branch: Option<String>,
    pub(crate) base: Option<String>,
    pub(crate) path: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct CreateDetails {
    pub(crate) branch: String,
    pub(crate) worktree_path: PathBuf,
    pub(crate) base: String,
    pub(crate) command: String,
    pub(crate) branch_existed: bool,
}

/// Existing target paths must be empty directories; anything else is refused
/// before git gets involved.
pub(crate) fn ensure_empty_directory(target: &Path) -> Result<()> {
    let metadata = fs::metadata(target)?;
    if !metadata.is_dir() {
        return Err(Error::validation(format!(
            "path exists and is not a directory: {}",
            target.display()
        )));
    }
    let mut entries = fs::read_dir(target)?;
    if entries.next().is_some() {
        return Err(Error::validation(format!(
            "path exists and is not empty: {}",
            target.display()
        )));
    }
    Ok(())
}

/// Create a worktree, deriving the branch from an explicit value or the
/// normalized logical name. On a git failure the already-created directory is
/// left behind; retries reuse it because empty directories pass the
/// pre-flight check.
pub(crate) fn create_worktree(
    repo_root: &Path,
    default_base: &str,
    options: &CreateOptions,
) -> Result<CreateDetails> {
    let name = options.name.trim();
    if name.is_empty() {
        return Err(Error::validation(
            "name is required to derive the branch and directory",
        ));
    }

    let branch = match options.branch.as_deref().map(str::trim) {
        Some(branch) if !branch.is_empty() => branch.to_string(),
        _ => normalize_branch_name(name),
    };
    if branch.is_empty() {
        return Err(Error::validation(format!(
            "unable to derive a valid branch name from `{name}`; provide --branch explicitly"
        )));
    }

    check_branch_format(repo_root, &branch)?;

    let base = options
        .base
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default_base)
        .to_string();

    let worktree_path = match options.path.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => resolve_worktree_path(repo_root, path),
        _ => default_worktree_path(repo_root, &branch),
    };

    if worktree_path.exists() {
        ensure_empty_directory(&worktree_path)?;
    } else {
        fs::create_dir_all(&worktree_path)?;
    }

    let branch_existed = branch_exists(repo_root, &branch)?;
    let path_str = worktree_path.to_string_lossy().to_string();
    let args: Vec<&str> = if branch_existed {
        vec!["worktree", "add", &path_str, &branch]
    } else {
        vec!["worktree", "add", "-b", &branch, &path_str, &base]
    };
    let command = git_command(&args);

    let output = run_git(&args, Some(repo_root))?;
    if !output.ok() {
        return Err(output.into_failure());
    }

    Ok(CreateDetails {
        branch,
        worktree_path,
        base,
        command,
        branch_existed,
    })
}

/// Worktrees whose path resolves equal to the input, whose branch equals the
/// input, or whose branch-as-ref equals the input. Zero and multiple matches
/// are both representable; the caller decides policy.
pub(crate) fn find_worktree_match<'a>(
    worktrees: &'a [WorktreeRecord],
    repo_root: &Path,
    input: &str,
) -> Vec<&'a WorktreeRecord> {
    let resolved = resolve_worktree_path(repo_root, input);
    worktrees
        .iter()
        .filter(|worktree| {
            if paths_equal(&worktree.path, &resolved) {
                return true;
            }
            match &worktree.branch {
                Some(branch) => branch == input || format!("refs/heads/{branch}") == input,
                None => false,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub(crate) struct RemoveOutcome {
    pub(crate) record: WorktreeRecord,
    pub(crate) command: String,
    pub(crate) forced: bool,
}

pub(crate) fn remove_worktree(
    repo_root: &Path,
    path_or_branch: &str,
    force: bool,
) -> Result<RemoveOutcome> {
    let input = path_or_branch.trim();
    if input.is_empty() {
        return Err(Error::validation(
            "a worktree path or branch name is required",
        ));
    }

    let worktrees = list_worktrees(repo_root)?;
    let matches = find_worktree_match(&worktrees, repo_root, input);

    let target = match matches.len() {
        0 => {
            return Err(Error::validation(format!(
                "no worktree matches `{input}`; run `list` to see available worktrees"
            )))
        }
        1 => matches[0].clone(),
        _ => {
            let paths: Vec<String> = matches
                .iter()
                .map(|record| record.path.display().to_string())
                .collect();
            return Err(Error::validation(format!(
                "multiple worktrees match `{input}`: {}",
                paths.join(", ")
            )));
        }
    };

    if !target.path.exists() {
        return Err(Error::validation(format!(
            "worktree path does not exist: {}; if it was deleted manually, run `prune` instead",
            target.path.display()
        )));
    }

    if !force {
        let summary = summarize_porcelain(&git::status_porcelain(&target.path)?);
        if !summary.clean {
            return Err(Error::validation(format!(
                "worktree has uncommitted changes ({}); re-run with --force to remove anyway",
                summary.describe()
            )));
        }
    }

    let path_str = target.path.to_string_lossy().to_string();
    let args: Vec<&str> = if force {
        vec!["worktree", "remove", "--force", &path_str]
    } else {
        vec!["worktree", "remove", &path_str]
    };
    let command = git_command(&args);

    let output = run_git(&args, Some(repo_root))?;
    if !output.ok() {
        return Err(output.into_failure());
    }

    Ok(RemoveOutcome {
        record: target,
        command,
        forced: force,
    })
}

#[derive(Debug, Clone)]
pub(crate) struct PruneOutcome {
    pub(crate) command: String,
    pub(crate) output: String,
}

pub(crate) fn prune_worktrees(repo_root: &Path, dry_run: bool) -> Result<PruneOutcome> {
    let args: Vec<&str> = if dry_run {
        vec!["worktree", "prune", "--dry-run"]
    } else {
        vec!["worktree", "prune"]
    };
    let command = git_command(&args);

    let output = run_git(&args, Some(repo_root))?;
    if !output.ok() {
        return Err(output.into_failure());
    }

    let mut raw = output.stdout.trim().to_string();
    if raw.is_empty() {
        raw = output.stderr.trim().to_string();
    }
    Ok(PruneOutcome {
        command,
        output: raw,
    })
}

/// Live dirty summary for one worktree path.
pub(crate) fn worktree_status(worktree_path: &Path) -> Result<status::StatusSummary> {
    Ok(summarize_porcelain(&git::status_porcelain(worktree_path)?))
}
