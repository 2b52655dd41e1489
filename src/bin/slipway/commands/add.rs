//! `slipway add` command

use anyhow::{Context, Result};

use crate::cli::{parse_option, AddArgs};
use slipway::core::declaration::DECLARATION_FILE;
use slipway::ops::add::{add_dependency, AddOptions};

pub fn execute(args: AddArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let manifest_path = root.join(DECLARATION_FILE);

    let mut options = Vec::with_capacity(args.option.len());
    for arg in &args.option {
        options.push(parse_option(arg)?);
    }

    let opts = AddOptions {
        name: args.name.clone(),
        repository: args.repository,
        pkg: args.pkg,
        version: args.version.clone(),
        options,
    };

    add_dependency(&manifest_path, &opts)?;

    println!("added {} {} to {}", args.name, args.version, manifest_path.display());
    Ok(())
}
