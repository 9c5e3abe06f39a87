//! Mutation scripts
//!
//! A script is a list of lines:
//!
//! ```text
//! # comments and blank lines are skipped
//! set count 42
//! set profile {"name": "ada", "langs": ["rust"]}
//! del count
//! disconnect
//! connect
//! ```

use std::sync::Arc;

use kvtap_inspector::{ConnectionHandle, InspectorError};
use kvtap_storage::{InMemoryStore, StorageError, StoredValue};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    Storage {
        line: usize,
        #[source]
        source: StorageError,
    },

    #[error("line {line}: {source}")]
    Inspector {
        line: usize,
        #[source]
        source: InspectorError,
    },
}

impl ScriptError {
    fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Set { key: String, value: StoredValue },
    Delete { key: String },
    Connect,
    Disconnect,
}

/// A command with its 1-based line number
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: ScriptCommand,
}

/// Parse a single line. Blank lines and comments yield `None`.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ScriptCommand>, ScriptError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let rest = rest.trim_start();

    let command = match verb {
        "set" => {
            let (key, json) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| ScriptError::syntax(line, "expected `set <key> <json>`"))?;
            let json: serde_json::Value = serde_json::from_str(json.trim())
                .map_err(|e| ScriptError::syntax(line, format!("invalid JSON value: {e}")))?;
            let value = StoredValue::from_json(json)
                .ok_or_else(|| ScriptError::syntax(line, "null cannot be stored"))?;
            ScriptCommand::Set {
                key: key.to_string(),
                value,
            }
        }
        "del" | "delete" | "remove" => {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                return Err(ScriptError::syntax(line, "expected `del <key>`"));
            }
            ScriptCommand::Delete {
                key: rest.to_string(),
            }
        }
        "connect" if rest.is_empty() => ScriptCommand::Connect,
        "disconnect" if rest.is_empty() => ScriptCommand::Disconnect,
        other => return Err(ScriptError::syntax(line, format!("unknown command `{other}`"))),
    };
    Ok(Some(command))
}

/// Parse a whole script
pub fn parse_script(input: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();
    for (idx, text) in input.lines().enumerate() {
        let line = idx + 1;
        if let Some(command) = parse_line(line, text)? {
            lines.push(ScriptLine { line, command });
        }
    }
    Ok(lines)
}

/// Counts of what a replay did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub writes: usize,
    pub deletes: usize,
    pub connects: usize,
    pub disconnects: usize,
}

/// Runs scripts against a store with an inspector attached
///
/// Counts accumulate over every `connect` and `run` call.
pub struct Replayer {
    store: Arc<InMemoryStore>,
    handle: ConnectionHandle,
    summary: ReplaySummary,
}

impl Replayer {
    pub fn new(store: Arc<InMemoryStore>, handle: ConnectionHandle) -> Self {
        Self {
            store,
            handle,
            summary: ReplaySummary::default(),
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }

    /// Connect the inspector before the script starts
    pub fn connect(&mut self) -> Result<(), InspectorError> {
        self.handle.on_connect()?;
        self.summary.connects += 1;
        Ok(())
    }

    /// Apply every command in order, stopping at the first failure
    ///
    /// Returns the running totals, including earlier calls.
    pub fn run(&mut self, script: &[ScriptLine]) -> Result<ReplaySummary, ScriptError> {
        let summary = &mut self.summary;
        for ScriptLine { line, command } in script {
            let line = *line;
            debug!(line, ?command, "Replaying");
            match command {
                ScriptCommand::Set { key, value } => {
                    self.store
                        .set(key.clone(), value.clone())
                        .map_err(|source| ScriptError::Storage { line, source })?;
                    summary.writes += 1;
                }
                ScriptCommand::Delete { key } => {
                    self.store
                        .remove(key)
                        .map_err(|source| ScriptError::Storage { line, source })?;
                    summary.deletes += 1;
                }
                ScriptCommand::Connect => {
                    self.handle
                        .on_connect()
                        .map_err(|source| ScriptError::Inspector { line, source })?;
                    summary.connects += 1;
                }
                ScriptCommand::Disconnect => {
                    self.handle.on_disconnect();
                    summary.disconnects += 1;
                }
            }
        }
        Ok(*summary)
    }
}
