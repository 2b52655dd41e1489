//! Dependency sources.
//!
//! Sources are responsible for turning a declaration into files on
//! disk: git repositories cloned from the configured host, and binary
//! packages downloaded from the registry.

pub mod git;
pub mod locate;
pub mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use git::{rev_for_version, GitFetcher};
pub use locate::{locate, redact};
pub use registry::{RegistryFetcher, RegistryResolver, ResolutionError};

/// Errors fetching one dependency onto disk.
///
/// Always fatal for the whole bootstrap run; there is no retry and no
/// partial success. Command lines and messages that may carry a git
/// URL are redacted before they end up here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A git subprocess could not be started at all.
    #[error("{detail} while fetching `{package}`")]
    GitSpawn { package: String, detail: String },

    /// A git step exited non-zero.
    #[error("`{command}` failed with exit code {code:?} while fetching `{package}`\n{stderr}")]
    GitExit {
        package: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The registry download failed or answered with a bad status.
    #[error("failed to download `{artifact}`")]
    Download {
        artifact: String,
        #[source]
        source: registry::ApiError,
    },

    /// The downloaded archive could not be staged in the cache.
    #[error("failed to cache archive for `{artifact}` at {path}")]
    Cache {
        artifact: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded archive could not be unpacked.
    #[error("failed to extract `{artifact}` into {dest}")]
    Extract {
        artifact: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Qualification performed on behalf of the fetcher failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
