//! Command handlers for CLI operations

use std::env;
use std::io::{Write as _, stderr, stdout};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use console::style;
use serde_json::{Value, from_str, to_string_pretty};
use toolbelt_tools::{
    ConfigError, LoggingConfig, ToolObserver, ToolRegistry, ToolbeltConfig, TracingObserver,
};
use tracing::{debug, warn};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Load the explicit config file, or the default one when present.
///
/// A broken default file is reported back instead of failing so the caller can
/// warn once logging is up.
///
/// # Errors
/// Returns an error if an explicitly requested config file cannot be loaded
pub fn load_config(explicit: Option<&Path>) -> Result<(ToolbeltConfig, Option<ConfigError>)> {
    if let Some(path) = explicit {
        let config = ToolbeltConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        return Ok((config, None));
    }

    Ok(match ToolbeltConfig::load_or_default() {
        Ok(config) => (config, None),
        Err(error) => (ToolbeltConfig::default(), Some(error)),
    })
}

/// Install the global subscriber; logs go to stderr so stdout carries only tool results.
pub fn init_logging(config: &LoggingConfig) {
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter)))
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_ansi(false)
                .with_target(true)
                .with_level(true),
        )
        .init();
}

/// Log a config problem that was tolerated at startup.
pub fn report_config_fallback(error: Option<ConfigError>) {
    if let Some(error) = error {
        warn!("Failed to load config from ~/.toolbelt/config.toml: {error}");
        warn!("Using default configuration");
    }
}

/// Switch the process working directory for the tool calls that follow.
///
/// # Errors
/// Returns an error if the directory cannot be entered
pub fn enter_project(project: &Path) -> Result<()> {
    env::set_current_dir(project)
        .with_context(|| format!("Failed to enter project directory {}", project.display()))?;
    debug!("Working directory: {}", project.display());
    Ok(())
}

fn registry(config: &ToolbeltConfig) -> ToolRegistry {
    let observer: Arc<dyn ToolObserver> = Arc::new(TracingObserver);
    ToolRegistry::standard(config, &observer)
}

/// Print every tool schema as pretty JSON.
///
/// # Errors
/// Returns an error if stdout cannot be written
pub fn handle_tools(config: &ToolbeltConfig) -> Result<ExitCode> {
    let schemas = registry(config).schemas();
    writeln!(stdout().lock(), "{}", to_string_pretty(&schemas)?)?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatch one tool call and print its text result.
///
/// A recovered tool failure is printed like any result and yields exit status 1.
///
/// # Errors
/// Returns an error for malformed JSON, an unknown tool, or arguments that do
/// not match the tool's schema
pub async fn handle_call(config: &ToolbeltConfig, name: &str, args: &str) -> Result<ExitCode> {
    let params: Value =
        from_str(args).with_context(|| format!("Arguments for {name} are not valid JSON"))?;
    let output = registry(config).dispatch(name, params).await?;

    let mut out = stdout().lock();
    if output.success {
        writeln!(out, "{}", output.message)?;
        Ok(ExitCode::SUCCESS)
    } else {
        writeln!(out, "{}", style(&output.message).red())?;
        Ok(ExitCode::FAILURE)
    }
}

/// Print the effective configuration as TOML.
///
/// # Errors
/// Returns an error if the configuration cannot be rendered
pub fn handle_config(config: &ToolbeltConfig) -> Result<ExitCode> {
    write!(stdout().lock(), "{}", config.to_toml()?)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_config_is_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("toolbelt.toml");
        fs::write(&path, "[shell]\nprogram = \"sh\"\n").unwrap();

        let (config, fallback) = load_config(Some(&path)).unwrap();
        assert_eq!(config.shell.program, "sh");
        assert!(fallback.is_none());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config(Some(&temp.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let err = handle_call(&ToolbeltConfig::default(), "bash", "{not json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
