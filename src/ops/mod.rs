//! High-level operations.
//!
//! This module contains the implementation of slipway commands.

pub mod add;
pub mod bootstrap;
pub mod proj;

pub use add::{add_dependency, AddOptions};
pub use bootstrap::{
    run, BootstrapError, BootstrapOptions, BootstrapOutcome, ResolvedKind, ResolvedLocation,
};
pub use proj::{generate, ManifestError};
