use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "opentrees",
    version,
    about = "Git worktrees as disposable per-task workspaces, mapped to host sessions"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// List git worktrees with branch, path, and HEAD info.
    #[command(alias = "ls")]
    List,
    /// Show dirty/clean summaries for worktrees.
    Status {
        /// Only report status for this worktree path.
        #[arg(long)]
        path: Option<String>,
        /// Include all known worktrees.
        #[arg(long)]
        all: bool,
        /// Include raw `git status --porcelain` output.
        #[arg(long)]
        porcelain: bool,
    },
    /// Create a new worktree (optionally creating its branch).
    Create {
        /// Logical name used to derive branch and folder.
        name: String,
        /// Explicit branch name (overrides the derived name).
        #[arg(long)]
        branch: Option<String>,
        /// Base ref for a new branch (default: HEAD).
        #[arg(long)]
        base: Option<String>,
        /// Explicit filesystem path for the worktree.
        #[arg(long)]
        path: Option<String>,
    },
    /// Remove a worktree (guarded unless --force).
    #[command(alias = "rm")]
    Remove {
        /// Worktree path or branch name to remove.
        path_or_branch: String,
        /// Remove even if the worktree has local changes.
        #[arg(long)]
        force: bool,
    },
    /// Prune stale worktree entries.
    Prune {
        /// Preview prune results.
        #[arg(long)]
        dry_run: bool,
    },
    /// Show a dashboard of known worktree sessions.
    Dashboard,
    /// Create a worktree and start a new host session in it.
    Start {
        /// Logical name used to derive branch and folder.
        name: String,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        path: Option<String>,
        /// Open the sessions UI after creation.
        #[arg(long)]
        open_sessions: bool,
    },
    /// Create a worktree and fork the current session into it.
    Fork {
        /// Logical name used to derive branch and folder.
        name: String,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        open_sessions: bool,
        /// Current session id (default: $OPENTREES_SESSION_ID).
        #[arg(long)]
        session: Option<String>,
    },
    /// Create multiple worktrees and fork the current session into each.
    Swarm {
        /// Task names, one worktree and session per task.
        #[arg(required = true)]
        tasks: Vec<String>,
        /// Branch prefix (default: wt/).
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        open_sessions: bool,
        /// Allow existing branches or paths instead of skipping them.
        #[arg(long)]
        force: bool,
        /// Current session id (default: $OPENTREES_SESSION_ID).
        #[arg(long)]
        session: Option<String>,
    },
    /// Register the plugin identifier in the host's JSONC config.
    Register {
        /// Config file to update (default: the host's config location).
        #[arg(long)]
        config: Option<String>,
        /// Identifier to add to the `plugin` array.
        #[arg(long)]
        plugin: Option<String>,
    },
    /// Host event hook: drop all mappings for a deleted session.
    #[command(hide = true)]
    SessionDeleted { session_id: String },
}
