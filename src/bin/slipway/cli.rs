//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Slipway - a dependency bootstrapper for L.B. Stanza projects
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch all dependencies, generate the manifest, and build
    Bootstrap(BootstrapArgs),

    /// Fully qualify a registry reference and print the result
    Resolve(ResolveArgs),

    /// Add a dependency to slipway.toml
    Add(AddArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BootstrapArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Registry base URL (overrides [registry] in slipway.toml)
    #[arg(long, env = "SLIPWAY_REGISTRY")]
    pub registry: Option<String>,

    /// Stop after generating the manifest; do not run `stanza build`
    #[arg(long)]
    pub no_build: bool,

    /// Extra arguments passed through to `stanza build`
    #[arg(last = true)]
    pub build_args: Vec<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Reference to qualify, e.g. `pcre/8.45` or `pcre/8.45#rrev`
    pub reference: String,

    /// Build option as `key=value`; repeatable
    #[arg(short, long = "option", value_name = "KEY=VALUE")]
    pub option: Vec<String>,

    /// Registry base URL
    #[arg(long, env = "SLIPWAY_REGISTRY")]
    pub registry: Option<String>,

    /// Rank candidates by registry timestamp instead of server order
    #[arg(long)]
    pub newest: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Dependency name
    pub name: String,

    /// Git repository identifier (`org/name`)
    #[arg(long, conflicts_with = "pkg")]
    pub repository: Option<String>,

    /// Registry package name
    #[arg(long)]
    pub pkg: Option<String>,

    /// Version token (repository) or exact version (registry)
    #[arg(long)]
    pub version: String,

    /// Build option as `key=value`; repeatable, registry only
    #[arg(short, long = "option", value_name = "KEY=VALUE")]
    pub option: Vec<String>,

    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

/// Parse one `key=value` option argument.
pub fn parse_option(arg: &str) -> anyhow::Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => anyhow::bail!("invalid option '{}'; expected key=value", arg),
    }
}
