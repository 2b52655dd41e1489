//! Slipway - a dependency bootstrapper for L.B. Stanza projects
//!
//! This crate provides the core library functionality for slipway:
//! declaration loading, dependency resolution and retrieval, manifest
//! generation, and delegation to the `stanza` build tool.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

pub use core::{
    ArtifactRef, ConfigError, DependencyDeclaration, DependencyPayload, OptionSet, Project,
    WorkspaceLayout,
};

pub use ops::bootstrap::{BootstrapError, BootstrapOptions, BootstrapOutcome};
pub use sources::FetchError;
pub use util::env::BootstrapEnv;
