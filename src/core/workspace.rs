//! Bootstrap workspace layout.
//!
//! The workspace is the `.slipway/` directory under the project root.
//! It holds everything a bootstrap run produces: fetched dependencies,
//! the generated `stanza.proj`, compiled package output, and cached
//! registry downloads. It is created exactly once per run and never
//! torn down by slipway.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Directory name of the workspace under the project root.
pub const WORKSPACE_DIR: &str = ".slipway";

/// File name of the generated manifest inside the workspace.
pub const MANIFEST_FILE: &str = "stanza.proj";

/// Errors creating the workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The workspace directory is already present. Re-running against
    /// a prior bootstrap would silently clobber it, so the run stops
    /// before creating or fetching anything.
    #[error(
        "workspace {path} already exists; remove it to bootstrap again"
    )]
    AlreadyExists { path: PathBuf },

    #[error("failed to create workspace directory {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The `.slipway/` directory and its fixed subdirectories.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    /// Describe the workspace layout under a project root without
    /// touching the filesystem.
    pub fn at(project_root: &Path) -> Self {
        WorkspaceLayout {
            root: project_root.join(WORKSPACE_DIR),
        }
    }

    /// Create the workspace directory tree.
    ///
    /// Fails fast with [`WorkspaceError::AlreadyExists`] when the
    /// workspace is already present; in that case nothing is created.
    pub fn create(project_root: &Path) -> Result<Self, WorkspaceError> {
        let layout = WorkspaceLayout::at(project_root);

        if layout.root.exists() {
            return Err(WorkspaceError::AlreadyExists {
                path: layout.root.clone(),
            });
        }

        for dir in [
            layout.root.clone(),
            layout.deps_dir(),
            layout.pkgs_dir(),
            layout.cache_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| WorkspaceError::Create { path: dir, source })?;
        }

        tracing::debug!("created workspace {}", layout.root.display());
        Ok(layout)
    }

    /// The workspace root (`<project>/.slipway`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where fetched dependencies live.
    pub fn deps_dir(&self) -> PathBuf {
        self.root.join("deps")
    }

    /// The directory of one named dependency.
    pub fn dep_dir(&self, name: &str) -> PathBuf {
        self.deps_dir().join(name)
    }

    /// Where the build tool writes compiled packages.
    pub fn pkgs_dir(&self) -> PathBuf {
        self.root.join("pkgs")
    }

    /// Where downloaded registry archives are kept.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Path of the generated manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }
}
