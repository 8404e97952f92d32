use std::process::{Command, ExitStatus};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::ShellConfig;
use crate::observer::{NoopObserver, ToolObserver};
use crate::tool::{
    Tool, ToolError, ToolInput, ToolOutput, ToolResult, parse_params, run_blocking,
};

/// Arguments for `bash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BashParams {
    /// Command line handed to the interpreter verbatim
    pub command: String,
}

/// Exit code of a finished process; signal deaths map to `-signal` on Unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

/// Run a command line through the configured interpreter and wait for it.
///
/// The command inherits the caller's environment and working directory. On a
/// zero exit status the captured standard output is returned with trailing
/// whitespace removed; standard error is dropped.
///
/// # Errors
/// Returns `CommandFailed` with the exit code and full standard error when the
/// command exits nonzero, or `SpawnFailed` when the interpreter cannot start.
pub fn run_command(shell: &ShellConfig, params: &BashParams) -> ToolResult<String> {
    let output = Command::new(&shell.program)
        .args(&shell.args)
        .arg(&params.command)
        .output()
        .map_err(|source| ToolError::SpawnFailed { source })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_owned())
    } else {
        Err(ToolError::CommandFailed {
            exit_code: exit_code(output.status),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Tool that executes shell commands.
///
/// The command string is trusted input: nothing confines what it touches.
pub struct BashTool {
    shell: ShellConfig,
    observer: Arc<dyn ToolObserver>,
}

impl BashTool {
    /// Create a `BashTool` running `bash -c` and reporting to no one.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shell(ShellConfig::default(), Arc::new(NoopObserver))
    }

    /// Create a `BashTool` with an explicit interpreter and observer.
    #[must_use]
    pub fn with_shell(shell: ShellConfig, observer: Arc<dyn ToolObserver>) -> Self {
        Self { shell, observer }
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &'static str {
        "bash"
    }

    fn description(&self) -> &'static str {
        "Execute a bash command and return its output. On failure the exit code and \
         standard error are returned instead."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute."
                }
            },
            "required": ["command"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, input: ToolInput) -> ToolResult<ToolOutput> {
        let params: BashParams = parse_params(self.name(), input)?;
        self.observer.on_start(
            self.name(),
            &format!("Executing bash command: {}", params.command),
        );

        let shell = self.shell.clone();
        match run_blocking(move || run_command(&shell, &params)).await {
            Ok(stdout) => {
                self.observer.on_success(
                    self.name(),
                    &format!(
                        "Bash command executed successfully, output length: {} chars",
                        stdout.chars().count()
                    ),
                );
                Ok(ToolOutput::success_with_data(
                    stdout,
                    json!({ "exit_code": 0 }),
                ))
            }
            Err(err) => {
                self.observer.on_failure(self.name(), &err);
                Ok(ToolOutput::from_error(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn run(command: &str) -> ToolResult<String> {
        run_command(
            &ShellConfig::default(),
            &BashParams {
                command: command.to_owned(),
            },
        )
    }

    #[test]
    fn test_success_returns_trimmed_stdout() {
        assert_eq!(run("echo hi").unwrap(), "hi");
        assert_eq!(run("printf '  padded  \\n\\n'").unwrap(), "  padded");
    }

    #[test]
    fn test_success_discards_stderr() {
        assert_eq!(run("echo out; echo noise >&2").unwrap(), "out");
    }

    #[test]
    fn test_nonzero_exit_reports_code_and_stderr() {
        let err = run("echo boom >&2; exit 3").unwrap_err();
        match &err {
            ToolError::CommandFailed { exit_code, stderr } => {
                assert_eq!(*exit_code, 3);
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.to_string(), "Command failed with exit code 3:\nboom\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_death_is_negative_exit_code() {
        let err = run("kill -9 $$").unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed { exit_code: -9, .. }));
    }

    #[test]
    fn test_missing_interpreter_is_spawn_failure() {
        let shell = ShellConfig {
            program: "definitely-not-a-shell-7f3a".to_owned(),
            args: vec!["-c".to_owned()],
        };
        let err = run_command(
            &shell,
            &BashParams {
                command: "true".to_owned(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::SpawnFailed { .. }));
    }

    #[test]
    fn test_command_may_mutate_filesystem() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("made.txt");
        run(&format!("echo made > '{}'", target.display())).unwrap();
        assert_eq!(fs::read_to_string(target).unwrap(), "made\n");
    }

    #[tokio::test]
    async fn test_tool_reports_failure_as_output() {
        let tool = BashTool::new();
        let output = tool
            .execute(ToolInput::new(json!({ "command": "echo boom >&2; exit 3" })))
            .await
            .unwrap();
        assert!(!output.success);
        assert!(output.message.contains('3'));
        assert!(output.message.contains("boom"));
    }

    #[tokio::test]
    async fn test_tool_success() {
        let tool = BashTool::default();
        let output = tool
            .execute(ToolInput::new(json!({ "command": "echo hi" })))
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.message, "hi");
    }
}
