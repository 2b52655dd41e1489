//! Core data structures for slipway.
//!
//! This module contains the foundational types used throughout slipway:
//! - Registry artifact identity (ArtifactRef, OptionSet)
//! - Project declarations (slipway.toml)
//! - Workspace layout (.slipway/)

pub mod artifact;
pub mod declaration;
pub mod workspace;

pub use artifact::{ArtifactRef, OptionSet};
pub use declaration::{
    ConfigError, DependencyDeclaration, DependencyPayload, Platform, Project, RegistryDependency,
    RepoDependency, DECLARATION_FILE,
};
pub use workspace::{WorkspaceError, WorkspaceLayout, MANIFEST_FILE, WORKSPACE_DIR};
