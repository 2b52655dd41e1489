//! Generated manifest: the workspace `stanza.proj`.
//!
//! The build tool consumes a single aggregate project file from the
//! workspace. It includes each fetched dependency's own fragment and,
//! when the consuming project has one, the project's root fragment.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::workspace::{WorkspaceLayout, MANIFEST_FILE};
use crate::util::fs::relative_path;

/// Errors writing the generated manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to write manifest {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write the workspace `stanza.proj` for the named dependencies.
///
/// One tolerant `include?` per dependency, in declaration order, so a
/// dependency that ships no fragment does not break the aggregate.
/// When `<project root>/stanza.proj` exists it is included with the
/// plain form, relative to the workspace, always last. Every emitted
/// path uses `/` separators; the downstream tool treats `\` as an
/// escape character.
pub fn generate(
    workspace: &WorkspaceLayout,
    project_root: &Path,
    dep_names: &[&str],
) -> Result<PathBuf, ManifestError> {
    let mut manifest = String::new();

    for name in dep_names {
        let fragment = workspace.dep_dir(name).join(MANIFEST_FILE);
        manifest.push_str(&format!("include? \"{}\"\n", forward_slashes(&fragment)));
    }

    let root_fragment = project_root.join(MANIFEST_FILE);
    if root_fragment.exists() {
        let relative = relative_path(workspace.root(), &root_fragment);
        manifest.push_str(&format!("include \"{}\"\n", forward_slashes(&relative)));
    }

    let path = workspace.manifest_path();
    std::fs::write(&path, &manifest).map_err(|source| ManifestError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::debug!("wrote {}", path.display());
    Ok(path)
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
