use crate::constants::WORKTREES_DIR_SUFFIX;
use std::path::{Component, Path, PathBuf};

/// Derive a git-safe branch name from free-form input.
///
/// Lowercases, collapses whitespace and underscores to single hyphens, maps
/// every other character outside `[a-z0-9./-]` to a hyphen, collapses hyphen
/// runs, and trims leading/trailing `-` and `/`. Input that normalizes to
/// nothing yields an empty string; callers must treat that as a validation
/// failure rather than a silent default.
pub(crate) fn normalize_branch_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut normalized = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let mapped = match ch {
            'A'..='Z' => ch.to_ascii_lowercase(),
            'a'..='z' | '0'..='9' | '.' | '/' => ch,
            '-' => '-',
            _ => '-',
        };
        if mapped == '-' && normalized.ends_with('-') {
            continue;
        }
        normalized.push(mapped);
    }

    normalized
        .trim_matches(|ch| ch == '-' || ch == '/')
        .to_string()
}

/// Default worktree location: a sibling of the repo, namespaced by repo name
/// so multiple repos do not collide.
/// `/a/repo` + `feat/x` -> `/a/repo.worktrees/feat/x`.
pub(crate) fn default_worktree_path(repo_root: &Path, branch: &str) -> PathBuf {
    let parent = repo_root.parent().unwrap_or(repo_root);
    let repo_name = repo_root
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string());
    parent
        .join(format!("{repo_name}{WORKTREES_DIR_SUFFIX}"))
        .join(branch)
}

/// Absolute input passes through lexically normalized; relative input
/// resolves against the repo root.
pub(crate) fn resolve_worktree_path(repo_root: &Path, input: &str) -> PathBuf {
    let candidate = Path::new(input);
    if candidate.is_absolute() {
        lexical_normalize(candidate)
    } else {
        lexical_normalize(&repo_root.join(candidate))
    }
}

/// Symlink-naive path equality: pure lexical resolution, no filesystem calls.
pub(crate) fn paths_equal(left: &Path, right: &Path) -> bool {
    lexical_normalize(left) == lexical_normalize(right)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
