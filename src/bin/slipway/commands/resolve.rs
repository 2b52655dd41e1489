//! `slipway resolve` command
//!
//! Debug utility: fully qualifies a registry reference against the
//! registry and prints the pinned string form.

use anyhow::{Context, Result};

use crate::cli::{parse_option, ResolveArgs};
use slipway::core::{ArtifactRef, OptionSet};
use slipway::sources::registry::{
    ArtifactoryClient, CandidateOrder, RegistryResolver, DEFAULT_REGISTRY_URL,
};

pub fn execute(args: ResolveArgs) -> Result<()> {
    let artifact: ArtifactRef = args
        .reference
        .parse()
        .with_context(|| format!("invalid reference '{}'", args.reference))?;

    let mut options = OptionSet::new();
    for arg in &args.option {
        let (key, value) = parse_option(arg)?;
        options.insert(key, value);
    }

    let registry_url = args.registry.as_deref().unwrap_or(DEFAULT_REGISTRY_URL);
    let client = ArtifactoryClient::new(registry_url)?;

    let order = if args.newest {
        CandidateOrder::NewestFirst
    } else {
        CandidateOrder::ServerOrder
    };
    let resolver = RegistryResolver::new(&client).with_order(order);

    let qualified = resolver.fully_qualify(&artifact, &options)?;
    println!("{}", qualified);

    Ok(())
}
