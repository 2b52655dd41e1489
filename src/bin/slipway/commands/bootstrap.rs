//! `slipway bootstrap` command

use anyhow::{Context, Result};

use crate::cli::BootstrapArgs;
use slipway::core::Project;
use slipway::ops::bootstrap::{run, BootstrapError, BootstrapOptions};
use slipway::sources::registry::CandidateOrder;
use slipway::util::env::BootstrapEnv;

pub fn execute(args: BootstrapArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    let project = Project::load(&root).map_err(BootstrapError::Config)?;
    let env = BootstrapEnv::from_process();

    let options = BootstrapOptions {
        registry_url: args.registry,
        no_build: args.no_build,
        build_args: args.build_args,
        order: CandidateOrder::ServerOrder,
        build_tool: None,
    };

    let outcome = run(&project, &env, &options)?;

    if outcome.built {
        println!(
            "{} bootstrapped: run `{}` to finish the build.",
            project.name(),
            outcome.next_stage.display()
        );
    } else {
        println!(
            "{} fetched; manifest written to {}",
            project.name(),
            outcome.manifest_path.display()
        );
    }

    Ok(())
}
