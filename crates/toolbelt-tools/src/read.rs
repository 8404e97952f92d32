//! File reading tool.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::observer::{NoopObserver, ToolObserver};
use crate::tool::{
    Tool, ToolError, ToolInput, ToolOutput, ToolResult, parse_params, run_blocking,
};

/// Arguments for `read_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadFileParams {
    /// Relative or absolute path of the file
    pub path: String,
}

/// Read the full text contents of a file.
///
/// # Errors
/// Returns `NotFound` when the file does not exist and `ReadFailed` for any
/// other I/O failure (permissions, directories, invalid UTF-8).
pub fn read_file(params: &ReadFileParams) -> ToolResult<String> {
    fs::read_to_string(&params.path).map_err(|source| {
        if source.kind() == IoErrorKind::NotFound {
            ToolError::NotFound {
                path: params.path.clone(),
            }
        } else {
            ToolError::ReadFailed {
                path: params.path.clone(),
                source,
            }
        }
    })
}

/// Tool returning the contents of a file.
pub struct ReadFileTool {
    observer: Arc<dyn ToolObserver>,
}

impl ReadFileTool {
    /// Create a `ReadFileTool` that reports to no one.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    /// Create a `ReadFileTool` that notifies `observer` about each call.
    #[must_use]
    pub fn with_observer(observer: Arc<dyn ToolObserver>) -> Self {
        Self { observer }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read the contents of a given relative file path."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative path of a file in the working directory."
                }
            },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: ToolInput) -> ToolResult<ToolOutput> {
        let params: ReadFileParams = parse_params(self.name(), input)?;
        let path = params.path.clone();
        self.observer
            .on_start(self.name(), &format!("Reading file: {path}"));

        match run_blocking(move || read_file(&params)).await {
            Ok(content) => {
                self.observer.on_success(
                    self.name(),
                    &format!("Successfully read file {path} ({} bytes)", content.len()),
                );
                Ok(ToolOutput::success(content))
            }
            Err(err) => {
                self.observer.on_failure(self.name(), &err);
                Ok(ToolOutput::from_error(&err))
            }
        }
    }
}
