pub(crate) const DEFAULT_HOST_BIN: &str = "opencode";
pub(crate) const DEFAULT_BASE_REVISION: &str = "HEAD";
pub(crate) const DEFAULT_SWARM_PREFIX: &str = "wt/";

pub(crate) const PLUGIN_IDENTIFIER: &str = "open-trees";
pub(crate) const SESSION_TITLE_PREFIX: &str = "wt:";

pub(crate) const STATE_DIR_NAME: &str = "opentrees";
pub(crate) const STATE_FILE_NAME: &str = "worktrees.json";
pub(crate) const HOST_CONFIG_DIR: &str = "opencode";
pub(crate) const HOST_CONFIG_FILE: &str = "opencode.jsonc";

pub(crate) const ENV_CONFIG_HOME: &str = "OPENTREES_CONFIG_HOME";
pub(crate) const ENV_SESSION_ID: &str = "OPENTREES_SESSION_ID";

pub(crate) const WORKTREES_DIR_SUFFIX: &str = ".worktrees";

pub(crate) const HEAD_SHORT_CHARS: usize = 7;
