use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Error kinds surfaced by the core modules. The command layer renders each
/// of these into a user-facing report block; none of them crosses the
/// process boundary as a panic.
#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("{0}")]
    Validation(String),

    /// Non-zero git exit. Carries whatever git printed so it can be surfaced
    /// verbatim.
    #[error("`{command}` failed")]
    Git {
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("not inside a git repository")]
    NotARepository,

    #[error("{action} failed: {details}")]
    SessionApi { action: String, details: String },

    #[error("state file {path} is corrupt: {details}")]
    CorruptState { path: String, details: String },

    #[error("config `plugin` field is not an array")]
    InvalidPluginField,

    #[error("current session ID is unavailable")]
    MissingSessionContext,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn session_api(action: impl Into<String>, details: impl Into<String>) -> Self {
        Self::SessionApi {
            action: action.into(),
            details: details.into(),
        }
    }
}
