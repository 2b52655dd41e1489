//! Conan v2 registry wire protocol.
//!
//! The registry speaks the Conan v2 REST API as served by Artifactory.
//! Everything slipway needs is three read-only listings plus one file
//! download, all rooted at a configured base URL:
//!
//! ```text
//! GET {base}/v2/conans/{name}/{version}/_/_/revisions
//!     -> {"revisions": [{"revision": "...", "time": "..."}, ...]}
//! GET {base}/v2/conans/{name}/{version}/_/_/revisions/{rrev}/search
//!     -> {"<package_id>": {"settings": {...}, "options": {...}}, ...}
//! GET {base}/v2/conans/{name}/{version}/_/_/revisions/{rrev}
//!         /packages/{package_id}/revisions
//!     -> {"revisions": [...]}
//! GET {base}/v2/conans/{name}/{version}/_/_/revisions/{rrev}
//!         /packages/{package_id}/revisions/{prev}/files/conan_package.tgz
//!     -> gzipped tarball
//! ```
//!
//! Any endpoint may instead answer with
//! `{"errors": [{"status": ..., "message": "..."}]}`, which is
//! surfaced as [`ApiError::Registry`].
//!
//! [`RegistryApi`] is the seam the resolver and fetcher are written
//! against; [`ArtifactoryClient`] is the production implementation,
//! and tests substitute in-memory fakes.

use std::io::Write;

use indexmap::IndexMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::core::ArtifactRef;

/// Base URL used when neither the CLI nor `slipway.toml` names one.
pub const DEFAULT_REGISTRY_URL: &str =
    "https://conan.slipway.dev/artifactory/api/conan/conan-local";

/// File name of the binary archive inside a package revision.
pub const PACKAGE_ARCHIVE: &str = "conan_package.tgz";

/// Errors talking to the registry.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid registry base URL `{0}`")]
    BaseUrl(String),

    #[error("registry request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The registry answered with its own error payload.
    #[error("registry reported: {message} (status {status})")]
    Registry { status: i64, message: String },

    #[error("malformed response from {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot download partially qualified reference `{0}`")]
    Unqualified(String),
}

/// One immutable revision of a recipe or of a package binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Revision {
    pub revision: String,
    /// Registry timestamp, ISO-8601 with a numeric offset.
    pub time: String,
}

/// One build configuration of a recipe revision, keyed by package id
/// in the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageVariant {
    #[serde(default)]
    pub settings: IndexMap<String, String>,
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RevisionList {
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: String,
}

/// Read access to a Conan v2 registry.
pub trait RegistryApi {
    /// List recipe revisions of `name/version`, registry order.
    fn recipe_revisions(&self, name: &str, version: &str) -> Result<Vec<Revision>, ApiError>;

    /// List the package variants built from one recipe revision, in
    /// server document order.
    fn package_variants(
        &self,
        name: &str,
        version: &str,
        recipe_revision: &str,
    ) -> Result<IndexMap<String, PackageVariant>, ApiError>;

    /// List the binary revisions of one package id, registry order.
    fn package_revisions(
        &self,
        name: &str,
        version: &str,
        recipe_revision: &str,
        package_id: &str,
    ) -> Result<Vec<Revision>, ApiError>;

    /// Stream the archive of a fully qualified reference into `out`,
    /// returning the number of bytes written.
    fn download_package(
        &self,
        artifact: &ArtifactRef,
        out: &mut dyn Write,
    ) -> Result<u64, ApiError>;
}

/// Blocking HTTP client for an Artifactory-hosted Conan registry.
#[derive(Debug, Clone)]
pub struct ArtifactoryClient {
    base: Url,
    client: reqwest::blocking::Client,
}

impl ArtifactoryClient {
    /// Create a client for the given base URL.
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base).map_err(|_| ApiError::BaseUrl(base.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::BaseUrl(base.to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|source| ApiError::Transport {
                url: base.to_string(),
                source,
            })?;

        Ok(ArtifactoryClient {
            base: parsed,
            client,
        })
    }

    /// Join percent-encoded path segments onto the base URL.
    fn conan_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response.text().map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        decode_response(status, &body, &url)
    }
}

/// Interpret a registry response body.
///
/// An error payload takes precedence over the HTTP status because the
/// registry's own message names the missing package; a bare non-2xx
/// without a payload is reported as such.
fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    url: &Url,
) -> Result<T, ApiError> {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(detail) = payload.errors.into_iter().next() {
            return Err(ApiError::Registry {
                status: detail.status,
                message: detail.message,
            });
        }
    }

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

impl RegistryApi for ArtifactoryClient {
    fn recipe_revisions(&self, name: &str, version: &str) -> Result<Vec<Revision>, ApiError> {
        let url = self.conan_url(&["v2", "conans", name, version, "_", "_", "revisions"])?;
        let list: RevisionList = self.get_json(url)?;
        Ok(list.revisions)
    }

    fn package_variants(
        &self,
        name: &str,
        version: &str,
        recipe_revision: &str,
    ) -> Result<IndexMap<String, PackageVariant>, ApiError> {
        let url = self.conan_url(&[
            "v2",
            "conans",
            name,
            version,
            "_",
            "_",
            "revisions",
            recipe_revision,
            "search",
        ])?;
        self.get_json(url)
    }

    fn package_revisions(
        &self,
        name: &str,
        version: &str,
        recipe_revision: &str,
        package_id: &str,
    ) -> Result<Vec<Revision>, ApiError> {
        let url = self.conan_url(&[
            "v2",
            "conans",
            name,
            version,
            "_",
            "_",
            "revisions",
            recipe_revision,
            "packages",
            package_id,
            "revisions",
        ])?;
        let list: RevisionList = self.get_json(url)?;
        Ok(list.revisions)
    }

    fn download_package(
        &self,
        artifact: &ArtifactRef,
        out: &mut dyn Write,
    ) -> Result<u64, ApiError> {
        let (rrev, package_id, prev) = match (
            artifact.recipe_revision(),
            artifact.package_id(),
            artifact.package_revision(),
        ) {
            (Some(r), Some(p), Some(v)) => (r, p, v),
            _ => return Err(ApiError::Unqualified(artifact.to_string())),
        };

        let url = self.conan_url(&[
            "v2",
            "conans",
            artifact.name(),
            artifact.version(),
            "_",
            "_",
            "revisions",
            rrev,
            "packages",
            package_id,
            "revisions",
            prev,
            "files",
            PACKAGE_ARCHIVE,
        ])?;
        tracing::debug!("GET {}", url);

        let mut response =
            self.client
                .get(url.clone())
                .send()
                .map_err(|source| ApiError::Transport {
                    url: url.to_string(),
                    source,
                })?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response.copy_to(out).map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })
    }
}
