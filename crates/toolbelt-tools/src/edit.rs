//! File editing tool for unique find-and-replace, append and create.
//!
//! An edit is only applied when its target is unambiguous: the search text must
//! occur exactly once, counted left to right without overlaps. Every mutation
//! rebuilds the whole file in memory and writes it back in a single write.

use std::fs;
use std::io::Error as IoError;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::observer::{NoopObserver, ToolObserver};
use crate::tool::{
    Tool, ToolError, ToolInput, ToolOutput, ToolResult, parse_params, run_blocking,
};

/// Arguments for `edit_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditFileParams {
    /// Path to the file to edit
    pub path: String,
    /// Literal text to find; empty means append (or create)
    pub old_str: String,
    /// Text to put in its place
    pub new_str: String,
}

/// Which of the three edit operations was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The file did not exist and was created with the replacement text.
    Created,
    /// The replacement text was appended to the existing contents.
    Appended,
    /// The single occurrence of the search text was replaced.
    Replaced,
}

impl EditOutcome {
    /// Text handed back to the caller for this outcome.
    pub fn message(self, path: &str) -> String {
        match self {
            Self::Created => format!("Successfully created and wrote to new file {path}"),
            Self::Appended | Self::Replaced => "OK".to_owned(),
        }
    }
}

fn unexpected(source: IoError) -> ToolError {
    ToolError::Unexpected { source }
}

/// Apply one create, append or unique-replace edit to a file.
///
/// # Errors
/// - `InvalidInput` for an empty path or identical search and replacement text,
///   before touching the filesystem
/// - `NoMatch` / `Ambiguous` when the search text occurs zero or several times;
///   the file is left unchanged
/// - `Unexpected` for any I/O failure
pub fn edit_file(params: &EditFileParams) -> ToolResult<EditOutcome> {
    if params.path.is_empty() || params.old_str == params.new_str {
        return Err(ToolError::InvalidInput);
    }

    let path = Path::new(&params.path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(unexpected)?;
    }

    if params.old_str.is_empty() && !path.try_exists().map_err(unexpected)? {
        fs::write(path, &params.new_str).map_err(unexpected)?;
        return Ok(EditOutcome::Created);
    }

    let content = fs::read_to_string(path).map_err(unexpected)?;

    let (new_content, outcome) = if params.old_str.is_empty() {
        (content + &params.new_str, EditOutcome::Appended)
    } else {
        match content.matches(params.old_str.as_str()).count() {
            0 => return Err(ToolError::NoMatch),
            1 => (
                content.replacen(params.old_str.as_str(), &params.new_str, 1),
                EditOutcome::Replaced,
            ),
            count => return Err(ToolError::Ambiguous { count }),
        }
    };

    fs::write(path, new_content).map_err(unexpected)?;
    Ok(outcome)
}

/// Tool for editing files with unique find-and-replace operations.
pub struct EditFileTool {
    observer: Arc<dyn ToolObserver>,
}

impl EditFileTool {
    /// Create an `EditFileTool` that reports to no one.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    /// Create an `EditFileTool` that notifies `observer` about each call.
    #[must_use]
    pub fn with_observer(observer: Arc<dyn ToolObserver>) -> Self {
        Self { observer }
    }
}

impl Default for EditFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &'static str {
        "edit_file"
    }

    fn description(&self) -> &'static str {
        "Make edits to a text file by replacing content. Replaces 'old_str' with \
         'new_str'; 'old_str' must occur exactly once. If 'old_str' is empty, \
         'new_str' is appended to the file, and the file is created if it does not exist."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file."
                },
                "old_str": {
                    "type": "string",
                    "description": "The exact text to search for and replace."
                },
                "new_str": {
                    "type": "string",
                    "description": "The text to replace old_str with."
                }
            },
            "required": ["path", "old_str", "new_str"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: ToolInput) -> ToolResult<ToolOutput> {
        let params: EditFileParams = parse_params(self.name(), input)?;
        let path = params.path.clone();
        self.observer.on_start(
            self.name(),
            &format!(
                "Editing file: {path} (replacing {} chars with {} chars)",
                params.old_str.chars().count(),
                params.new_str.chars().count()
            ),
        );

        match run_blocking(move || edit_file(&params)).await {
            Ok(outcome) => {
                let summary = match outcome {
                    EditOutcome::Created => format!("Created new file {path}"),
                    EditOutcome::Appended | EditOutcome::Replaced => {
                        format!("Successfully edited file {path}")
                    }
                };
                self.observer.on_success(self.name(), &summary);
                Ok(ToolOutput::success(outcome.message(&path)))
            }
            Err(err) => {
                self.observer.on_failure(self.name(), &err);
                Ok(ToolOutput::from_error(&err))
            }
        }
    }
}
