//! CLI argument definitions for the appstate binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Inspect and edit appstate snapshot files
#[derive(Parser, Debug)]
#[command(name = "appstate")]
#[command(about = "appstate: inspect and edit persisted state trees")]
#[command(version)]
pub struct Cli {
    /// Snapshot file to operate on
    #[arg(short, long, default_value = "state.json", env = "APPSTATE_FILE", global = true)]
    pub file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Debounce for persisted writes, in milliseconds
    #[arg(long, default_value_t = 0, env = "APPSTATE_DEBOUNCE_MS", global = true)]
    pub debounce_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the whole tree
    Show,
    /// Print the value at a path
    Get(PathArgs),
    /// Store a JSON value at a path
    Set(SetArgs),
    /// Delete the value at a path
    Delete(PathArgs),
    /// List the keys of the node at a path (the root by default)
    Keys(KeysArgs),
}

/// Arguments for commands addressing one path
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Dotted path relative to the root, e.g. `countries.AU`
    pub path: String,
}

/// Arguments for the set command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Dotted path relative to the root
    pub path: String,

    /// JSON value; anything that does not parse as JSON is stored as text
    pub value: String,
}

/// Arguments for the keys command
#[derive(clap::Args, Debug)]
pub struct KeysArgs {
    /// Dotted path relative to the root
    #[arg(default_value = "")]
    pub path: String,
}
