//! External session collaborator. The core only depends on the
//! [`SessionApi`] contract; [`HostClient`] wires it to the host CLI as a
//! subprocess speaking JSON on stdout, with `{data}/{error}` envelopes and
//! bare objects both accepted.

use crate::error::{Error, Result};
use crate::process::{best_error_line, run_capture};
use chrono::{SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use std::path::Path;

pub(crate) trait SessionApi {
    /// Create a session rooted at `directory`; returns the new session id.
    fn create(&self, directory: &Path, title: &str) -> Result<String>;
    /// Fork an existing session into `directory`; returns the fork's id.
    fn fork(&self, session_id: &str, directory: &Path) -> Result<String>;
    fn update_title(&self, session_id: &str, title: &str) -> Result<()>;
    fn open_sessions_ui(&self) -> Result<()>;
    /// Last-updated timestamp of a session, if the host reports one.
    fn updated_at(&self, session_id: &str) -> Result<Option<String>>;
}

pub(crate) struct HostClient {
    bin: String,
}

impl HostClient {
    pub(crate) fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn invoke(&self, action: &str, args: &[&str]) -> Result<Value> {
        let output = run_capture(&self.bin, args, None)
            .map_err(|err| Error::session_api(action, format!("`{}`: {err}", self.bin)))?;
        if !output.status.success() {
            return Err(Error::session_api(
                action,
                best_error_line(&output.stderr),
            ));
        }

        let trimmed = output.stdout.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        let parsed: Value = serde_json::from_str(trimmed)
            .map_err(|err| Error::session_api(action, format!("unparseable response: {err}")))?;
        unwrap_envelope(parsed, action)
    }
}

/// The host wraps responses in `{data, error}` envelopes in some code paths
/// and returns raw values in others; accept both, reject error envelopes.
pub(crate) fn unwrap_envelope(response: Value, action: &str) -> Result<Value> {
    let Value::Object(ref map) = response else {
        return Ok(response);
    };
    if !map.contains_key("data") && !map.contains_key("error") {
        return Ok(response);
    }

    if let Some(error) = map.get("error").filter(|value| !value.is_null()) {
        let details = match error {
            Value::String(message) => message.clone(),
            Value::Object(fields) => fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        };
        return Err(Error::session_api(action, details));
    }

    match map.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Err(Error::session_api(action, "response carried no data")),
    }
}

fn require_id(value: &Value, action: &str) -> Result<String> {
    value
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::session_api(action, "response carried no session id"))
}

impl SessionApi for HostClient {
    fn create(&self, directory: &Path, title: &str) -> Result<String> {
        let dir = directory.to_string_lossy();
        let value = self.invoke(
            "session create",
            &[
                "session", "create", "--directory", &dir, "--title", title, "--json",
            ],
        )?;
        require_id(&value, "session create")
    }

    fn fork(&self, session_id: &str, directory: &Path) -> Result<String> {
        let dir = directory.to_string_lossy();
        let value = self.invoke(
            "session fork",
            &["session", "fork", session_id, "--directory", &dir, "--json"],
        )?;
        require_id(&value, "session fork")
    }

    fn update_title(&self, session_id: &str, title: &str) -> Result<()> {
        self.invoke(
            "session title update",
            &["session", "update", session_id, "--title", title, "--json"],
        )?;
        Ok(())
    }

    fn open_sessions_ui(&self) -> Result<()> {
        self.invoke("open sessions UI", &["tui", "open-sessions"])?;
        Ok(())
    }

    fn updated_at(&self, session_id: &str) -> Result<Option<String>> {
        let value = self.invoke("session lookup", &["session", "get", session_id, "--json"])?;
        Ok(format_timestamp(value.get("time").and_then(|t| t.get("updated"))))
    }
}

/// Millisecond epoch numbers become ISO-8601; strings pass through; anything
/// else is absent.
pub(crate) fn format_timestamp(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(number)) => {
            let millis = number.as_i64()?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Some(Value::String(raw)) if !raw.trim().is_empty() => Some(raw.clone()),
        _ => None,
    }
}
