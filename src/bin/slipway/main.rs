//! Slipway CLI - a dependency bootstrapper for L.B. Stanza projects

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slipway::ops::bootstrap::BootstrapError;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);

        // A failed delegated build mirrors the child's exit code;
        // everything else exits 1.
        let code = match e.downcast_ref::<BootstrapError>() {
            Some(BootstrapError::BuildTool { code }) => *code,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Bootstrap(args) => commands::bootstrap::execute(args),
        Commands::Resolve(args) => commands::resolve::execute(args),
        Commands::Add(args) => commands::add::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
