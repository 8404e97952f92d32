//! Filesystem and shell toolbelt for an autonomous agent.
//!
//! This crate provides the four operations an agent loop hands to a model:
//! - `read_file` via [`ReadFileTool`]
//! - `list_files` via [`ListFilesTool`]
//! - `bash` via [`BashTool`]
//! - `edit_file` via [`EditFileTool`]
//!
//! Every operation failure is recovered into a plain-text [`ToolOutput`] so the
//! caller can read and react to it like any other tool result.
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]

/// Shell execution tool implementation.
mod bash;
/// Configuration loading for the toolbelt.
mod config;
/// Targeted text edit tool implementation.
mod edit;
/// Recursive directory listing tool implementation.
mod list;
/// Injected notification hooks for tool calls.
mod observer;
/// File reading tool implementation.
mod read;
/// Tool registry for managing available tools.
mod registry;
/// Core abstractions shared by all tools.
mod tool;

pub use bash::{BashParams, BashTool, run_command};
pub use config::{ConfigError, LoggingConfig, ShellConfig, ToolbeltConfig};
pub use edit::{EditFileParams, EditFileTool, EditOutcome, edit_file};
pub use list::{HIDDEN_MARKER, ListFilesParams, ListFilesTool, list_files};
pub use observer::{
    NoopObserver, ObserverEvent, RecordingObserver, ToolObserver, TracingObserver,
};
pub use read::{ReadFileParams, ReadFileTool, read_file};
pub use registry::{ToolRegistry, ToolSchema};
pub use tool::{ErrorKind, Tool, ToolError, ToolInput, ToolOutput, ToolResult};
