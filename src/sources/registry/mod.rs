//! Registry dependencies: prebuilt binary packages from a Conan v2
//! compatible registry.
//!
//! A registry dependency is declared loosely (`pkg`, `version`, an
//! option set) and must be pinned to one exact binary before it can be
//! downloaded. Pinning walks three listings in order: recipe
//! revisions of the version, package variants of each recipe revision,
//! and binary revisions of each variant. The first variant built for
//! the host OS whose settings equal the requested options wins, and
//! its first listed binary revision completes the reference.
//!
//! "First" is the registry's own response order by default; the
//! listings carry timestamps but no recency promise, and selection
//! stays reproducible by trusting the order rather than re-ranking.
//! [`CandidateOrder::NewestFirst`] swaps in timestamp ranking without
//! touching the traversal.

pub mod api;

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::{ArtifactRef, OptionSet};
use crate::sources::FetchError;

pub use api::{
    ApiError, ArtifactoryClient, PackageVariant, RegistryApi, Revision, DEFAULT_REGISTRY_URL,
};

/// Errors pinning a loosely-specified package to an exact binary.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// A registry listing failed before any match decision was made.
    #[error("registry query for `{package}` failed")]
    Query {
        package: String,
        #[source]
        source: ApiError,
    },

    /// No variant matched the host platform and requested options.
    #[error(
        "no package matching `{package}/{version}` with options [{options}] \
         was found in the registry"
    )]
    NoMatch {
        package: String,
        version: String,
        options: OptionSet,
    },
}

/// How to rank candidate revisions within one listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateOrder {
    /// Trust the registry's response order.
    #[default]
    ServerOrder,
    /// Re-rank by the registry timestamp, newest first.
    NewestFirst,
}

impl CandidateOrder {
    fn arrange(&self, mut revisions: Vec<Revision>) -> Vec<Revision> {
        match self {
            CandidateOrder::ServerOrder => revisions,
            CandidateOrder::NewestFirst => {
                // The timestamps are ISO-8601 with a fixed-width
                // numeric offset, so lexicographic order is
                // chronological order.
                revisions.sort_by(|a, b| b.time.cmp(&a.time));
                revisions
            }
        }
    }
}

/// The Conan `settings.os` label for an OS name as `std::env::consts::OS`
/// spells it.
pub fn os_label(os: &str) -> String {
    match os {
        "linux" => "Linux".to_string(),
        "macos" => "Macos".to_string(),
        "windows" => "Windows".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

/// The Conan `settings.os` label of the machine slipway runs on.
pub fn host_os_label() -> String {
    os_label(std::env::consts::OS)
}

/// Pins loosely-specified references to exact binaries.
pub struct RegistryResolver<'a> {
    api: &'a dyn RegistryApi,
    host_os: String,
    order: CandidateOrder,
}

impl<'a> RegistryResolver<'a> {
    /// Create a resolver for the current host platform.
    pub fn new(api: &'a dyn RegistryApi) -> Self {
        RegistryResolver {
            api,
            host_os: host_os_label(),
            order: CandidateOrder::default(),
        }
    }

    /// Resolve as if running on a host with the given OS label.
    pub fn with_host_os(mut self, label: impl Into<String>) -> Self {
        self.host_os = label.into();
        self
    }

    /// Set the candidate ranking policy.
    pub fn with_order(mut self, order: CandidateOrder) -> Self {
        self.order = order;
        self
    }

    /// Qualify `artifact` down to one exact binary matching the host
    /// OS and the requested `options`.
    ///
    /// A reference that is already fully qualified is returned
    /// unchanged without touching the registry. Otherwise every
    /// recipe revision is scanned in candidate order; a variant is a
    /// match when its `settings.os` equals the host label and its
    /// whole settings map equals `options`. A matching variant with
    /// no binary revisions is skipped and scanning continues. No
    /// partial result is ever returned.
    pub fn fully_qualify(
        &self,
        artifact: &ArtifactRef,
        options: &OptionSet,
    ) -> Result<ArtifactRef, ResolutionError> {
        if artifact.is_fully_qualified() {
            tracing::debug!("{} is already fully qualified", artifact);
            return Ok(artifact.clone());
        }

        let recipe_revisions = self.order.arrange(
            self.api
                .recipe_revisions(artifact.name(), artifact.version())
                .map_err(|e| query_failed(artifact, e))?,
        );

        for recipe in &recipe_revisions {
            tracing::debug!(
                "considering recipe revision {} ({})",
                recipe.revision,
                recipe.time
            );

            let variants = self
                .api
                .package_variants(artifact.name(), artifact.version(), &recipe.revision)
                .map_err(|e| query_failed(artifact, e))?;

            for (package_id, variant) in &variants {
                let Some(variant_os) = variant.settings.get("os") else {
                    tracing::debug!("skipping {}: no os setting", package_id);
                    continue;
                };
                if *variant_os != self.host_os {
                    tracing::debug!("skipping {}: os {} is not {}", package_id, variant_os, self.host_os);
                    continue;
                }

                let settings: OptionSet = variant
                    .settings
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                if settings != *options {
                    tracing::debug!(
                        "skipping {}: settings [{}] differ from requested [{}]",
                        package_id,
                        settings,
                        options
                    );
                    continue;
                }

                let binaries = self.order.arrange(
                    self.api
                        .package_revisions(
                            artifact.name(),
                            artifact.version(),
                            &recipe.revision,
                            package_id,
                        )
                        .map_err(|e| query_failed(artifact, e))?,
                );

                let Some(binary) = binaries.first() else {
                    tracing::debug!("skipping {}: no package revisions", package_id);
                    continue;
                };

                let qualified = artifact
                    .clone()
                    .with_recipe_revision(recipe.revision.clone())
                    .with_package_id(package_id.clone())
                    .with_package_revision(binary.revision.clone());
                tracing::info!("resolved {} to {}", artifact, qualified);
                return Ok(qualified);
            }
        }

        Err(ResolutionError::NoMatch {
            package: artifact.name().to_string(),
            version: artifact.version().to_string(),
            options: options.clone(),
        })
    }
}

fn query_failed(artifact: &ArtifactRef, source: ApiError) -> ResolutionError {
    ResolutionError::Query {
        package: artifact.name().to_string(),
        source,
    }
}

/// Downloads and unpacks registry binaries.
pub struct RegistryFetcher<'a> {
    api: &'a dyn RegistryApi,
    resolver: RegistryResolver<'a>,
}

impl<'a> RegistryFetcher<'a> {
    pub fn new(api: &'a dyn RegistryApi, resolver: RegistryResolver<'a>) -> Self {
        RegistryFetcher { api, resolver }
    }

    /// Fetch the binary for `artifact` into `dest`.
    ///
    /// The reference is fully qualified first (a no-op when it already
    /// is), the archive is staged under `cache_dir`, and its contents
    /// are unpacked into `dest`. Returns the qualified reference.
    pub fn download_and_extract(
        &self,
        artifact: &ArtifactRef,
        options: &OptionSet,
        cache_dir: &Path,
        dest: &Path,
    ) -> Result<ArtifactRef, FetchError> {
        let qualified = self.resolver.fully_qualify(artifact, options)?;

        let cache_error = |path: &Path, source: std::io::Error| FetchError::Cache {
            artifact: qualified.to_string(),
            path: path.to_path_buf(),
            source,
        };

        let mut staged =
            NamedTempFile::new_in(cache_dir).map_err(|e| cache_error(cache_dir, e))?;
        let bytes = self
            .api
            .download_package(&qualified, staged.as_file_mut())
            .map_err(|source| FetchError::Download {
                artifact: qualified.to_string(),
                source,
            })?;
        staged
            .as_file_mut()
            .flush()
            .map_err(|e| cache_error(cache_dir, e))?;
        tracing::debug!("downloaded {} ({} bytes)", qualified, bytes);

        let archive_path = cache_dir.join(format!(
            "{}-{}-{}.tgz",
            qualified.name(),
            qualified.version(),
            qualified.package_id().unwrap_or("unknown")
        ));
        staged
            .persist(&archive_path)
            .map_err(|e| cache_error(&archive_path, e.error))?;

        let extract_error = |source: std::io::Error| FetchError::Extract {
            artifact: qualified.to_string(),
            dest: dest.to_path_buf(),
            source,
        };

        let archive = std::fs::File::open(&archive_path).map_err(|e| cache_error(&archive_path, e))?;
        let decoder = flate2::read::GzDecoder::new(archive);
        std::fs::create_dir_all(dest).map_err(extract_error)?;
        tar::Archive::new(decoder).unpack(dest).map_err(extract_error)?;

        tracing::info!("extracted {} into {}", qualified, dest.display());
        Ok(qualified)
    }
}
