use crate::cli::Commands;
use crate::config::Config;
use crate::constants::{ENV_SESSION_ID, HOST_CONFIG_DIR, HOST_CONFIG_FILE, PLUGIN_IDENTIFIER};
use crate::dashboard::dashboard_report;
use crate::error::Error;
use crate::format::{format_command, format_error, ErrorDetails};
use crate::git::{self, WorktreeRecord};
use crate::jsonc::update_config_text;
use crate::session::HostClient;
use crate::state::SessionStore;
use crate::ui::progress;
use crate::worktree::{
    create_worktree, find_worktree_match, prune_worktrees, remove_worktree, worktree_status,
    CreateOptions,
};
use crate::worktree_session::{
    fork_session, handle_session_deleted, start_session, swarm_sessions, SessionFlowOptions,
    SwarmOptions,
};
use anyhow::{anyhow, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) fn run(command: Commands, config: &Config) -> Result<String> {
    match command {
        Commands::List => cmd_list(),
        Commands::Status {
            path,
            all,
            porcelain,
        } => cmd_status(path.as_deref(), all, porcelain),
        Commands::Create {
            name,
            branch,
            base,
            path,
        } => cmd_create(config, CreateOptions { name, branch, base, path }),
        Commands::Remove {
            path_or_branch,
            force,
        } => cmd_remove(&path_or_branch, force),
        Commands::Prune { dry_run } => cmd_prune(dry_run),
        Commands::Dashboard => cmd_dashboard(config),
        Commands::Start {
            name,
            branch,
            base,
            path,
            open_sessions,
        } => cmd_start(
            config,
            SessionFlowOptions {
                create: CreateOptions { name, branch, base, path },
                open_sessions,
            },
        ),
        Commands::Fork {
            name,
            branch,
            base,
            path,
            open_sessions,
            session,
        } => cmd_fork(
            config,
            SessionFlowOptions {
                create: CreateOptions { name, branch, base, path },
                open_sessions,
            },
            session,
        ),
        Commands::Swarm {
            tasks,
            prefix,
            open_sessions,
            force,
            session,
        } => cmd_swarm(
            config,
            SwarmOptions {
                tasks,
                prefix,
                open_sessions,
                force,
            },
            session,
        ),
        Commands::Register { config: path, plugin } => {
            cmd_register(path.as_deref(), plugin.as_deref())
        }
        Commands::SessionDeleted { session_id } => cmd_session_deleted(&session_id),
    }
}

/// Render a core error as the user-facing message/hint/details block. This is
/// the only place error kinds turn into text; nothing panics past here.
fn render(err: Error) -> anyhow::Error {
    let text = match &err {
        Error::Validation(message) => format_error(message, ErrorDetails::default()),
        Error::Git {
            command,
            stdout,
            stderr,
        } => {
            let mut details = stderr.trim().to_string();
            if details.is_empty() {
                details = stdout.trim().to_string();
            }
            format_error(
                &format!("`{command}` failed"),
                ErrorDetails {
                    hint: None,
                    details: Some(&details),
                },
            )
        }
        Error::NotARepository => format_error(
            "not inside a git repository",
            ErrorDetails {
                hint: Some("run this command from within a git repository"),
                details: None,
            },
        ),
        Error::SessionApi { .. } | Error::CorruptState { .. } | Error::Io(_) => {
            format_error(&err.to_string(), ErrorDetails::default())
        }
        Error::InvalidPluginField => format_error(
            &err.to_string(),
            ErrorDetails {
                hint: Some("fix the `plugin` field in the config so it is an array of strings"),
                details: None,
            },
        ),
        Error::MissingSessionContext => format_error(
            &err.to_string(),
            ErrorDetails {
                hint: Some("pass --session <id> or set OPENTREES_SESSION_ID"),
                details: None,
            },
        ),
    };
    anyhow!(text)
}

fn current_session(flag: Option<String>) -> Option<String> {
    flag.filter(|id| !id.trim().is_empty())
        .or_else(|| env::var(ENV_SESSION_ID).ok())
        .filter(|id| !id.trim().is_empty())
}

fn cmd_list() -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    let worktrees = git::list_worktrees(&repo_root).map_err(render)?;

    let rows: Vec<Vec<String>> = if worktrees.is_empty() {
        vec![vec!["-".into(), "-".into(), "-".into(), "-".into(), "-".into()]]
    } else {
        worktrees
            .iter()
            .map(|worktree| {
                vec![
                    worktree.branch_label(),
                    worktree.path.display().to_string(),
                    worktree.head_short(),
                    yes_no(worktree.locked),
                    yes_no(worktree.prunable),
                ]
            })
            .collect()
    };

    let table = crate::format::render_table(&["branch", "path", "head", "locked", "prunable"], &rows);
    let command = format_command(&["git", "worktree", "list", "--porcelain"]);
    Ok(format!(
        "Worktrees ({}):\n{table}\nCommand: {command}",
        worktrees.len()
    ))
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

fn cmd_status(path: Option<&str>, all: bool, porcelain: bool) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    let worktrees = git::list_worktrees(&repo_root).map_err(render)?;

    let selected: Vec<&WorktreeRecord> = if let Some(input) = path {
        let matches = find_worktree_match(&worktrees, &repo_root, input);
        if matches.is_empty() {
            return Err(render(Error::validation(format!(
                "no worktree matches `{input}`; run `list` to see available worktrees"
            ))));
        }
        matches
    } else if all {
        worktrees.iter().collect()
    } else {
        // Default scope is the worktree we are standing in; rev-parse
        // already resolved repo_root to the current worktree's top level.
        let current: Vec<&WorktreeRecord> = worktrees
            .iter()
            .filter(|worktree| crate::paths::paths_equal(&worktree.path, &repo_root))
            .collect();
        if current.is_empty() {
            worktrees.iter().collect()
        } else {
            current
        }
    };

    let mut sections = Vec::new();
    for worktree in selected {
        let label = worktree.branch_label();
        if !worktree.path.exists() {
            sections.push(format!("{label} {}\n  missing on disk", worktree.path.display()));
            continue;
        }
        match worktree_status(&worktree.path) {
            Ok(summary) => {
                let mut block = format!(
                    "{label} {}\n  {}",
                    worktree.path.display(),
                    summary.describe()
                );
                if porcelain && !summary.lines.is_empty() {
                    for line in &summary.lines {
                        block.push_str(&format!("\n  {line}"));
                    }
                }
                sections.push(block);
            }
            Err(err) => sections.push(format!(
                "{label} {}\n  error: {}",
                worktree.path.display(),
                crate::process::first_line(&err.to_string())
            )),
        }
    }

    Ok(sections.join("\n"))
}

fn cmd_create(config: &Config, options: CreateOptions) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    progress(&format!("create: preparing worktree `{}`", options.name));
    let details = create_worktree(&repo_root, &config.default_base, &options).map_err(render)?;

    let mut lines = vec![
        "Worktree created.".to_string(),
        format!("Branch: {}", details.branch),
        format!("Path: {}", details.worktree_path.display()),
        format!("Command: {}", details.command),
    ];
    if !details.branch_existed {
        lines.push(format!("Base: {}", details.base));
    } else if options.base.is_some() {
        lines.push("Note: base ignored because the branch already exists.".to_string());
    }
    Ok(lines.join("\n"))
}

fn cmd_remove(path_or_branch: &str, force: bool) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    progress(&format!("remove: resolving worktree `{path_or_branch}`"));
    let outcome = remove_worktree(&repo_root, path_or_branch, force).map_err(render)?;

    let mut lines = vec![
        "Worktree removed.".to_string(),
        format!("Branch: {}", outcome.record.branch_label()),
        format!("Path: {}", outcome.record.path.display()),
        format!("Command: {}", outcome.command),
    ];
    if outcome.forced {
        lines.push("Note: removed with --force.".to_string());
    }
    Ok(lines.join("\n"))
}

fn cmd_prune(dry_run: bool) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    let outcome = prune_worktrees(&repo_root, dry_run).map_err(render)?;

    let output = if outcome.output.is_empty() {
        "Output: (none)".to_string()
    } else {
        format!("Output: {}", outcome.output)
    };
    Ok([
        "Worktree prune complete.".to_string(),
        format!("Command: {}", outcome.command),
        output,
    ]
    .join("\n"))
}

fn cmd_dashboard(config: &Config) -> Result<String> {
    let api = HostClient::new(&config.host_bin);
    let store = SessionStore::open_default().map_err(render)?;
    dashboard_report(&api, &store).map_err(render)
}

fn cmd_start(config: &Config, options: SessionFlowOptions) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    progress(&format!("start: creating worktree `{}`", options.create.name));
    let api = HostClient::new(&config.host_bin);
    let store = SessionStore::open_default().map_err(render)?;
    start_session(&repo_root, &config.default_base, &api, &store, &options).map_err(render)
}

fn cmd_fork(
    config: &Config,
    options: SessionFlowOptions,
    session: Option<String>,
) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    progress(&format!("fork: creating worktree `{}`", options.create.name));
    let api = HostClient::new(&config.host_bin);
    let store = SessionStore::open_default().map_err(render)?;
    let current = current_session(session);
    fork_session(
        &repo_root,
        &config.default_base,
        &api,
        &store,
        current.as_deref(),
        &options,
    )
    .map_err(render)
}

fn cmd_swarm(config: &Config, options: SwarmOptions, session: Option<String>) -> Result<String> {
    let repo_root = git::repo_root(None).map_err(render)?;
    progress(&format!("swarm: creating {} worktree(s)", options.tasks.len()));
    let api = HostClient::new(&config.host_bin);
    let store = SessionStore::open_default().map_err(render)?;
    let current = current_session(session);
    swarm_sessions(
        &repo_root,
        &config.default_base,
        &config.swarm_prefix,
        &api,
        &store,
        current.as_deref(),
        &options,
    )
    .map_err(render)
}

fn default_host_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(HOST_CONFIG_DIR).join(HOST_CONFIG_FILE))
}

fn cmd_register(config_path: Option<&str>, plugin: Option<&str>) -> Result<String> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => default_host_config_path().ok_or_else(|| {
            render(Error::validation(
                "could not determine the host config location; pass --config",
            ))
        })?,
    };
    let identifier = plugin.unwrap_or(PLUGIN_IDENTIFIER);

    let existing = match fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(render(err.into())),
    };

    let merge = update_config_text(existing.as_deref(), identifier).map_err(render)?;
    if !merge.changed {
        return Ok(format!(
            "Plugin `{identifier}` already registered in {}.",
            path.display()
        ));
    }

    write_config(&path, &merge.updated_text).map_err(render)?;
    Ok(format!(
        "Plugin `{identifier}` registered in {}.\nPlugins: {}",
        path.display(),
        merge.plugins.join(", ")
    ))
}

fn write_config(path: &Path, text: &str) -> crate::error::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}

fn cmd_session_deleted(session_id: &str) -> Result<String> {
    let store = SessionStore::open_default().map_err(render)?;
    let removed = handle_session_deleted(&store, session_id).map_err(render)?;
    Ok(format!(
        "Removed {removed} mapping(s) for session {session_id}."
    ))
}
