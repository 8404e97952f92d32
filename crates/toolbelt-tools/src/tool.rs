use std::io::Error as IoError;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Error as SerdeJsonError, Value, json};
use thiserror::Error;
use tokio::task::spawn_blocking;

/// Broad classification of a [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested path is absent.
    NotFound,
    /// The edit search text matches more than once.
    AmbiguousTarget,
    /// The edit search text matches zero times.
    NoMatch,
    /// The request is structurally valid but semantically unusable.
    InvalidInput,
    /// An underlying OS, subprocess or I/O error.
    ExternalFailure,
    /// The subprocess ran to completion but exited with a nonzero status.
    CommandNonzeroExit,
    /// The caller broke the registry contract (unknown tool, malformed arguments).
    ContractViolation,
}

/// Errors that can occur during tool execution.
///
/// The `Display` text of each recoverable variant is the exact message handed
/// back to the caller as tool output.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The file to read does not exist.
    #[error("Error: File not found at '{path}'")]
    NotFound {
        /// Path as supplied by the caller.
        path: String,
    },

    /// Reading the file failed for a reason other than absence.
    #[error("Error: Failed to read file '{path}': {source}")]
    ReadFailed {
        /// Path as supplied by the caller.
        path: String,
        /// Underlying I/O failure.
        source: IoError,
    },

    /// The base directory could not be listed.
    #[error("Error: Failed to list files in '{path}': {source}")]
    ListFailed {
        /// Path as supplied by the caller.
        path: String,
        /// Underlying I/O failure.
        source: IoError,
    },

    /// Empty path or an edit whose search and replacement text are identical.
    #[error(
        "Error: Invalid input parameters. Path cannot be empty and old_str must differ from new_str."
    )]
    InvalidInput,

    /// The search text does not occur in the file.
    #[error("Error: old_str not found in file.")]
    NoMatch,

    /// The search text occurs more than once in the file.
    #[error("Error: old_str found {count} times, must be unique for safety.")]
    Ambiguous {
        /// Number of non-overlapping occurrences found.
        count: usize,
    },

    /// The command exited with a nonzero status.
    #[error("Command failed with exit code {exit_code}:\n{stderr}")]
    CommandFailed {
        /// Exit status reported by the shell.
        exit_code: i32,
        /// Full captured standard error.
        stderr: String,
    },

    /// The command interpreter could not be started.
    #[error("Error: Failed to start command: {source}")]
    SpawnFailed {
        /// Underlying spawn failure.
        source: IoError,
    },

    /// Any other I/O failure while editing a file.
    #[error("Error: An unexpected error occurred: {source}")]
    Unexpected {
        /// Underlying I/O failure.
        source: IoError,
    },

    /// The argument record does not match the tool's input schema.
    #[error("Malformed input for '{tool}': {source}")]
    MalformedInput {
        /// Name of the tool that rejected the record.
        tool: &'static str,
        /// Deserialization failure.
        source: SerdeJsonError,
    },

    /// No tool is registered under the requested name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// Classifies this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Ambiguous { .. } => ErrorKind::AmbiguousTarget,
            Self::NoMatch => ErrorKind::NoMatch,
            Self::InvalidInput => ErrorKind::InvalidInput,
            Self::ReadFailed { .. }
            | Self::ListFailed { .. }
            | Self::SpawnFailed { .. }
            | Self::Unexpected { .. } => ErrorKind::ExternalFailure,
            Self::CommandFailed { .. } => ErrorKind::CommandNonzeroExit,
            Self::MalformedInput { .. } | Self::UnknownTool(_) => ErrorKind::ContractViolation,
        }
    }

    /// Whether this error is reported to the caller as ordinary tool output.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::ContractViolation
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Input parameters provided to a tool for execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    /// JSON value containing the tool-specific parameters.
    pub params: Value,
}

impl ToolInput {
    /// Wraps a caller-supplied argument record.
    pub const fn new(params: Value) -> Self {
        Self { params }
    }
}

/// Output returned by a tool after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the tool execution succeeded.
    pub success: bool,
    /// Text handed back to the caller: the payload on success, the error message otherwise.
    pub message: String,
    /// Optional structured form of the result.
    pub data: Option<Value>,
}

impl ToolOutput {
    /// Creates a successful output with the given message and no data.
    pub fn success<T: Into<String>>(message: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a successful output with the given message and associated data.
    pub fn success_with_data<T: Into<String>>(message: T, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Creates an error output with the given message.
    pub fn error<T: Into<String>>(message: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Recovers an operation failure into a failed output.
    pub fn from_error(error: &ToolError) -> Self {
        let data = match error {
            ToolError::CommandFailed { exit_code, stderr } => Some(json!({
                "exit_code": exit_code,
                "stderr": stderr,
            })),
            ToolError::Ambiguous { count } => Some(json!({ "count": count })),
            _ => None,
        };
        Self {
            success: false,
            message: error.to_string(),
            data,
        }
    }
}

/// Trait for implementing executable tools that can be invoked by the system.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique identifier for this tool.
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of what this tool does.
    fn description(&self) -> &'static str;

    /// Returns the JSON schema of the argument record this tool accepts.
    fn input_schema(&self) -> Value;

    /// Executes the tool with the provided input parameters.
    ///
    /// Operation failures come back as `Ok` with `success == false`.
    ///
    /// # Errors
    ///
    /// Returns a `ToolError` only when the argument record does not match the schema.
    async fn execute(&self, input: ToolInput) -> ToolResult<ToolOutput>;
}

/// Deserializes a tool's static parameter struct from the argument record.
pub(crate) fn parse_params<T: DeserializeOwned>(
    tool: &'static str,
    input: ToolInput,
) -> ToolResult<T> {
    serde_json::from_value(input.params)
        .map_err(|source| ToolError::MalformedInput { tool, source })
}

/// Runs a blocking operation on Tokio's blocking pool and waits for it to finish.
pub(crate) async fn run_blocking<T, F>(operation: F) -> ToolResult<T>
where
    F: FnOnce() -> ToolResult<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(operation)
        .await
        .map_err(|err| ToolError::Unexpected {
            source: IoError::other(err),
        })?
}
