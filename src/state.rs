//! Persistent worktree<->session mappings. One JSON document under the
//! user's config home; read-modify-write with atomic replace, no
//! cross-process lock (last writer wins, accepted for single-user usage).

use crate::constants::{ENV_CONFIG_HOME, STATE_DIR_NAME, STATE_FILE_NAME};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionMappingEntry {
    #[serde(rename = "worktreePath")]
    pub(crate) worktree_path: String,
    pub(crate) branch: String,
    #[serde(rename = "sessionID")]
    pub(crate) session_id: String,
    #[serde(rename = "createdAt")]
    pub(crate) created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WorktreeState {
    #[serde(default)]
    pub(crate) entries: Vec<SessionMappingEntry>,
}

pub(crate) struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the deterministic default location:
    /// `$OPENTREES_CONFIG_HOME` (or the platform config dir) +
    /// `opentrees/worktrees.json`.
    pub(crate) fn open_default() -> Result<Self> {
        let base = env::var(ENV_CONFIG_HOME)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .or_else(dirs::config_dir)
            .ok_or_else(|| Error::validation("could not determine a config directory"))?;
        Ok(Self::at(base.join(STATE_DIR_NAME).join(STATE_FILE_NAME)))
    }

    pub(crate) fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Absent file is an empty state, not an error; a file that exists but
    /// fails to parse is `CorruptState` carrying the raw parse error.
    pub(crate) fn read(&self) -> Result<WorktreeState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WorktreeState::default())
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw).map_err(|err| Error::CorruptState {
            path: self.path.display().to_string(),
            details: err.to_string(),
        })
    }

    /// Append one entry (insertion order is chronological) and persist.
    /// Returns the resolved file path for user-facing reporting.
    pub(crate) fn append(&self, entry: SessionMappingEntry) -> Result<PathBuf> {
        let mut state = self.read()?;
        state.entries.push(entry);
        self.write(&state)?;
        Ok(self.path.clone())
    }

    /// Drop every entry for `session_id`. Returns the number removed; zero
    /// matches is not an error and does not rewrite the file.
    pub(crate) fn remove_by_session(&self, session_id: &str) -> Result<usize> {
        let mut state = self.read()?;
        let before = state.entries.len();
        state
            .entries
            .retain(|entry| entry.session_id != session_id);
        let removed = before - state.entries.len();
        if removed > 0 {
            self.write(&state)?;
        }
        Ok(removed)
    }

    /// Write-then-rename so readers never observe a torn document.
    fn write(&self, state: &WorktreeState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(state).map_err(|err| Error::CorruptState {
            path: self.path.display().to_string(),
            details: err.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, format!("{rendered}\n"))?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
