//! Project declarations: loading and validating `slipway.toml`.
//!
//! The declaration file names the project and lists its direct
//! dependencies. Each dependency is either a git repository at a
//! version token or a registry package with build options. Parsing
//! goes through raw serde structs and a validating conversion so that
//! every shape error is reported with the dependency it occurred in.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::core::artifact::OptionSet;

/// Conventional file name of the declaration file.
pub const DECLARATION_FILE: &str = "slipway.toml";

/// Errors loading or validating `slipway.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("dependency `{0}` specifies both `repository` and `pkg`; pick one")]
    AmbiguousSource(String),

    #[error("dependency `{0}` must specify either `repository` or `pkg`")]
    MissingSource(String),

    #[error("dependency `{0}` is missing a `version`")]
    MissingVersion(String),

    #[error("dependency `{0}` is a repository dependency and cannot take `options`")]
    OptionsOnRepository(String),

    #[error(
        "dependency `{dependency}` has an options table under unknown platform `{key}`; \
         expected `linux`, `macos`, or `windows`"
    )]
    UnknownPlatform { dependency: String, key: String },

    #[error("option `{key}` of dependency `{dependency}` must be a string")]
    InvalidOption { dependency: String, key: String },
}

/// A platform an options overlay can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// The platform slipway is currently running on, if it is one an
    /// overlay can target.
    pub fn current() -> Option<Platform> {
        Platform::from_key(std::env::consts::OS)
    }

    /// Parse an overlay table key.
    pub fn from_key(key: &str) -> Option<Platform> {
        match key {
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::Macos),
            "windows" => Some(Platform::Windows),
            _ => None,
        }
    }

    /// The overlay table key for this platform.
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A git repository dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDependency {
    /// `org/name` identifier on the git host.
    pub repository: String,
    /// Version token (`latest` or a tag version).
    pub version: String,
}

/// A registry package dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDependency {
    /// Package name in the registry.
    pub package: String,
    /// Exact package version.
    pub version: String,
    /// Base option set used to select a package variant.
    pub options: OptionSet,
    /// Per-platform overlays merged over the base options when
    /// bootstrapping on that platform.
    pub overlays: BTreeMap<Platform, BTreeMap<String, String>>,
}

impl RegistryDependency {
    /// The option set in effect on the given platform: the base
    /// options with the matching overlay (if any) merged on top.
    pub fn effective_options(&self, platform: Option<Platform>) -> OptionSet {
        match platform.and_then(|p| self.overlays.get(&p)) {
            Some(overlay) => self.options.merged_with(overlay),
            None => self.options.clone(),
        }
    }
}

/// The discriminated payload of a dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyPayload {
    Repository(RepoDependency),
    Registry(RegistryDependency),
}

/// One named entry of the `[dependencies]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    name: String,
    payload: DependencyPayload,
}

impl DependencyDeclaration {
    /// Get the dependency name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the payload.
    pub fn payload(&self) -> &DependencyPayload {
        &self.payload
    }
}

/// A validated project declaration.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    root: PathBuf,
    dependencies: Vec<DependencyDeclaration>,
    registry_url: Option<String>,
}

impl Project {
    /// Load and validate `slipway.toml` from the given project root.
    ///
    /// The root is made absolute first: the workspace and every path
    /// in the generated manifest derive from it, and a relative base
    /// would leave the manifest resolving against slipway's own
    /// working directory instead of the workspace.
    pub fn load(root: &Path) -> Result<Project, ConfigError> {
        let root = std::path::absolute(root).map_err(|source| ConfigError::Read {
            path: root.to_path_buf(),
            source,
        })?;
        let path = root.join(DECLARATION_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let raw: RawDeclarationFile =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        raw.validate(&root)
    }

    /// Get the project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the dependencies in declaration order.
    pub fn dependencies(&self) -> &[DependencyDeclaration] {
        &self.dependencies
    }

    /// Get the registry base URL override from `[registry]`, if any.
    pub fn registry_url(&self) -> Option<&str> {
        self.registry_url.as_deref()
    }
}

/// `slipway.toml` as written, before validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDeclarationFile {
    project: RawProject,

    #[serde(default)]
    dependencies: IndexMap<String, RawDependency>,

    #[serde(default)]
    registry: Option<RawRegistry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRegistry {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawDependency {
    repository: Option<String>,
    pkg: Option<String>,
    version: Option<String>,
    options: Option<toml::Table>,
}

impl RawDeclarationFile {
    fn validate(self, root: &Path) -> Result<Project, ConfigError> {
        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for (name, raw) in self.dependencies {
            dependencies.push(raw.validate(&name)?);
        }

        Ok(Project {
            name: self.project.name,
            root: root.to_path_buf(),
            dependencies,
            registry_url: self.registry.and_then(|r| r.url),
        })
    }
}

impl RawDependency {
    fn validate(self, name: &str) -> Result<DependencyDeclaration, ConfigError> {
        let payload = match (self.repository, self.pkg) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::AmbiguousSource(name.to_string()));
            }
            (None, None) => {
                return Err(ConfigError::MissingSource(name.to_string()));
            }
            (Some(repository), None) => {
                if self.options.is_some() {
                    return Err(ConfigError::OptionsOnRepository(name.to_string()));
                }
                let version = self
                    .version
                    .ok_or_else(|| ConfigError::MissingVersion(name.to_string()))?;
                DependencyPayload::Repository(RepoDependency {
                    repository,
                    version,
                })
            }
            (None, Some(package)) => {
                let version = self
                    .version
                    .ok_or_else(|| ConfigError::MissingVersion(name.to_string()))?;
                let (options, overlays) = split_options(name, self.options.unwrap_or_default())?;
                DependencyPayload::Registry(RegistryDependency {
                    package,
                    version,
                    options,
                    overlays,
                })
            }
        };

        Ok(DependencyDeclaration {
            name: name.to_string(),
            payload,
        })
    }
}

/// Split a raw options table into the base option set and the
/// per-platform overlays. String values are base options; a nested
/// table must be keyed by a known platform and hold only strings.
fn split_options(
    dependency: &str,
    raw: toml::Table,
) -> Result<(OptionSet, BTreeMap<Platform, BTreeMap<String, String>>), ConfigError> {
    let mut options = OptionSet::new();
    let mut overlays = BTreeMap::new();

    for (key, value) in raw {
        match value {
            toml::Value::String(v) => options.insert(key, v),
            toml::Value::Table(table) => {
                let platform =
                    Platform::from_key(&key).ok_or_else(|| ConfigError::UnknownPlatform {
                        dependency: dependency.to_string(),
                        key: key.clone(),
                    })?;

                let mut overlay = BTreeMap::new();
                for (k, v) in table {
                    match v {
                        toml::Value::String(v) => {
                            overlay.insert(k, v);
                        }
                        _ => {
                            return Err(ConfigError::InvalidOption {
                                dependency: dependency.to_string(),
                                key: k,
                            });
                        }
                    }
                }
                overlays.insert(platform, overlay);
            }
            _ => {
                return Err(ConfigError::InvalidOption {
                    dependency: dependency.to_string(),
                    key,
                });
            }
        }
    }

    Ok((options, overlays))
}
