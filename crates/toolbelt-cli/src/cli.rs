use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the toolbelt
#[derive(Debug, Parser)]
#[command(name = "toolbelt")]
#[command(about = "Run filesystem and shell tools the way an agent calls them", long_about = None)]
pub struct Cli {
    /// Working directory for tool calls
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Config file to load instead of ~/.toolbelt/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Action to perform
    #[command(subcommand)]
    pub command: Commands,
}

/// Toolbelt subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the name, description and input schema of every tool
    Tools,

    /// Invoke one tool with a JSON argument record
    Call {
        /// Tool name, e.g. read_file
        name: String,

        /// Argument record as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// Print the effective configuration
    Config,
}
