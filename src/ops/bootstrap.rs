//! The bootstrap run: fetch every dependency, generate the manifest,
//! hand off to the build tool.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::declaration::{DependencyPayload, Platform, Project};
use crate::core::workspace::{WorkspaceError, WorkspaceLayout};
use crate::core::{ArtifactRef, ConfigError};
use crate::ops::proj::{self, ManifestError};
use crate::sources::registry::{
    ApiError, ArtifactoryClient, CandidateOrder, RegistryFetcher, RegistryResolver,
    DEFAULT_REGISTRY_URL,
};
use crate::sources::{FetchError, GitFetcher, ResolutionError};
use crate::util::env::BootstrapEnv;
use crate::util::process::{find_executable, ProcessBuilder};

/// Name of the delegated build tool.
pub const BUILD_TOOL: &str = "stanza";

/// Run-level errors, aggregated from every stage.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Registry(#[from] ApiError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("`stanza` was not found on PATH; install L.B. Stanza or pass --no-build")]
    BuildToolMissing,

    #[error("failed to invoke `stanza`: {detail}")]
    BuildToolFailed { detail: String },

    /// The delegated build exited non-zero; the process exit code
    /// mirrors `code`.
    #[error("`stanza build` exited with code {code}")]
    BuildTool { code: i32 },
}

/// Options for a bootstrap run.
#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Registry base URL override; beats `[registry]` in slipway.toml.
    pub registry_url: Option<String>,
    /// Stop after generating the manifest.
    pub no_build: bool,
    /// Extra arguments appended to the `stanza build` invocation.
    pub build_args: Vec<String>,
    /// Candidate ordering for registry resolution.
    pub order: CandidateOrder,
    /// Build tool to invoke; looked up on PATH when unset.
    pub build_tool: Option<PathBuf>,
}

/// What fetching one dependency put on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedKind {
    /// A git source tree, carrying its own fragment.
    SourceTree,
    /// An extracted registry binary, pinned to `reference`.
    BinaryArtifact { reference: ArtifactRef },
}

/// Where one fetched dependency ended up.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    /// Declared dependency name.
    pub name: String,
    /// Directory under `.slipway/deps/`.
    pub path: PathBuf,
    /// What kind of payload is there.
    pub kind: ResolvedKind,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct BootstrapOutcome {
    /// Every fetched dependency, in declaration order.
    pub fetched: Vec<ResolvedLocation>,
    /// The generated manifest.
    pub manifest_path: PathBuf,
    /// The executable the operator should invoke next.
    pub next_stage: PathBuf,
    /// Whether the delegated build ran.
    pub built: bool,
}

/// Bootstrap `project`: create the workspace, fetch every declared
/// dependency in order, write the manifest, and (unless `no_build`)
/// run `stanza build -pkg pkgs` from the workspace.
///
/// The first failure aborts the run; nothing is retried and nothing
/// is torn down.
pub fn run(
    project: &Project,
    env: &BootstrapEnv,
    options: &BootstrapOptions,
) -> Result<BootstrapOutcome, BootstrapError> {
    let workspace = WorkspaceLayout::create(project.root())?;

    let registry_url = options
        .registry_url
        .as_deref()
        .or(project.registry_url())
        .unwrap_or(DEFAULT_REGISTRY_URL);
    let client = ArtifactoryClient::new(registry_url)?;
    let resolver = RegistryResolver::new(&client).with_order(options.order);
    let fetcher = RegistryFetcher::new(&client, resolver);

    let git = GitFetcher::new(env);
    let platform = Platform::current();

    let mut fetched = Vec::with_capacity(project.dependencies().len());
    for decl in project.dependencies() {
        let dest = workspace.dep_dir(decl.name());
        let kind = match decl.payload() {
            DependencyPayload::Repository(repo) => {
                tracing::info!(
                    "fetching {} ({} at {})",
                    decl.name(),
                    repo.repository,
                    repo.version
                );
                git.fetch(&dest, &repo.repository, &repo.version)?;
                ResolvedKind::SourceTree
            }
            DependencyPayload::Registry(reg) => {
                let option_set = reg.effective_options(platform);
                tracing::info!(
                    "resolving {} ({}/{} with [{}])",
                    decl.name(),
                    reg.package,
                    reg.version,
                    option_set
                );
                let artifact = ArtifactRef::new(reg.package.clone(), reg.version.clone());
                let reference = fetcher
                    .download_and_extract(&artifact, &option_set, &workspace.cache_dir(), &dest)
                    .map_err(|e| match e {
                        // Surface resolution failures at the run
                        // level rather than as a download failure.
                        FetchError::Resolution(e) => BootstrapError::Resolution(e),
                        other => BootstrapError::Fetch(other),
                    })?;
                ResolvedKind::BinaryArtifact { reference }
            }
        };
        fetched.push(ResolvedLocation {
            name: decl.name().to_string(),
            path: dest,
            kind,
        });
    }

    let dep_names: Vec<&str> = project.dependencies().iter().map(|d| d.name()).collect();
    let manifest_path = proj::generate(&workspace, project.root(), &dep_names)?;

    let next_stage = project.root().join(project.name());

    if options.no_build {
        tracing::info!("skipping `{} build` as requested", BUILD_TOOL);
        return Ok(BootstrapOutcome {
            fetched,
            manifest_path,
            next_stage,
            built: false,
        });
    }

    let stanza = match &options.build_tool {
        Some(path) => path.clone(),
        None => find_executable(BUILD_TOOL).ok_or(BootstrapError::BuildToolMissing)?,
    };
    let cmd = ProcessBuilder::new(stanza)
        .args(["build", "-pkg", "pkgs"])
        .args(&options.build_args)
        .cwd(workspace.root());

    tracing::info!("running {}", cmd.display_command());
    let status = cmd.status().map_err(|e| BootstrapError::BuildToolFailed {
        detail: format!("{:#}", e),
    })?;

    if !status.success() {
        return Err(match status.code() {
            Some(code) => BootstrapError::BuildTool { code },
            None => BootstrapError::BuildToolFailed {
                detail: "terminated by signal".to_string(),
            },
        });
    }

    Ok(BootstrapOutcome {
        fetched,
        manifest_path,
        next_stage,
        built: true,
    })
}
