//! Tool registry binding tool names to their handlers.

use std::convert::AsRef;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::bash::BashTool;
use crate::config::ToolbeltConfig;
use crate::edit::EditFileTool;
use crate::list::ListFilesTool;
use crate::observer::ToolObserver;
use crate::read::ReadFileTool;
use crate::tool::{Tool, ToolError, ToolInput, ToolOutput, ToolResult};

type ToolList = Arc<Vec<Arc<dyn Tool>>>;

/// Advertised shape of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    /// Name the tool is dispatched under
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// JSON schema of the argument record
    pub input_schema: Value,
}

/// Registry for managing available tools
#[derive(Clone)]
pub struct ToolRegistry {
    tools: ToolList,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(Vec::new()),
        }
    }

    /// Create a registry holding `read_file`, `list_files`, `bash` and `edit_file`,
    /// all reporting to `observer`.
    #[must_use]
    pub fn standard(config: &ToolbeltConfig, observer: &Arc<dyn ToolObserver>) -> Self {
        Self::new()
            .with_tool(Arc::new(ReadFileTool::with_observer(Arc::clone(observer))))
            .with_tool(Arc::new(ListFilesTool::with_observer(Arc::clone(observer))))
            .with_tool(Arc::new(BashTool::with_shell(
                config.shell.clone(),
                Arc::clone(observer),
            )))
            .with_tool(Arc::new(EditFileTool::with_observer(Arc::clone(observer))))
    }

    /// Add a tool to the registry
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        Arc::make_mut(&mut self.tools).push(tool);
        self
    }

    /// Get a tool by name, if it exists
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|tool_ref| tool_ref.name() == name)
            .cloned()
    }

    /// List all available tools
    #[must_use]
    pub fn list_tools(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(AsRef::as_ref).collect()
    }

    /// Describe every registered tool, in registration order
    #[must_use]
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|tool| ToolSchema {
                name: tool.name(),
                description: tool.description(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Forward an argument record to the named tool.
    ///
    /// # Errors
    /// Returns `UnknownTool` when no tool has that name, or `MalformedInput` when
    /// the record does not match the tool's schema. Operation failures are
    /// reported inside the returned `ToolOutput`.
    pub async fn dispatch(&self, name: &str, params: Value) -> ToolResult<ToolOutput> {
        let tool = self
            .get_tool(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        tool.execute(ToolInput::new(params)).await
    }

    /// Get number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
