//! Implementation of `slipway add`.
//!
//! Appends a dependency declaration to `slipway.toml`, preserving the
//! formatting and comments of everything already in the file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use toml_edit::{DocumentMut, InlineTable, Item, Table};

use crate::util::fs;

/// Options for adding a dependency.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Dependency name.
    pub name: String,

    /// Git repository identifier (`org/name`).
    pub repository: Option<String>,

    /// Registry package name.
    pub pkg: Option<String>,

    /// Version token (repository) or exact version (registry).
    pub version: String,

    /// Registry build options, as `key=value` pairs.
    pub options: Vec<(String, String)>,
}

/// Add a dependency to `slipway.toml`.
///
/// An existing declaration with the same name is replaced.
pub fn add_dependency(manifest_path: &Path, opts: &AddOptions) -> Result<()> {
    let content = fs::read_to_string(manifest_path)?;
    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("failed to parse {}", manifest_path.display()))?;

    let dep_value = build_dependency_value(opts)?;

    // Ensure [dependencies] exists as an explicit table.
    if !doc.contains_key("dependencies") {
        doc["dependencies"] = Item::Table(Table::new());
    }
    doc["dependencies"][&opts.name] = dep_value;

    fs::write_string(manifest_path, &doc.to_string())?;

    Ok(())
}

/// Build the TOML value for a dependency declaration.
fn build_dependency_value(opts: &AddOptions) -> Result<Item> {
    let mut table = InlineTable::new();

    match (&opts.repository, &opts.pkg) {
        (Some(_), Some(_)) => {
            bail!(
                "dependency `{}` cannot name both `repository` and `pkg`",
                opts.name
            );
        }
        (None, None) => {
            bail!(
                "dependency `{}` must name either `repository` or `pkg`",
                opts.name
            );
        }
        (Some(repository), None) => {
            if !opts.options.is_empty() {
                bail!(
                    "dependency `{}` is a repository dependency and cannot take options",
                    opts.name
                );
            }
            table.insert("repository", repository.clone().into());
        }
        (None, Some(pkg)) => {
            table.insert("pkg", pkg.clone().into());
        }
    }

    table.insert("version", opts.version.clone().into());

    if !opts.options.is_empty() {
        let mut options = InlineTable::new();
        for (key, value) in &opts.options {
            options.insert(key.as_str(), value.clone().into());
        }
        table.insert("options", options.into());
    }

    Ok(Item::Value(table.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::core::declaration::{DependencyPayload, Project, DECLARATION_FILE};

    fn write_manifest(text: &str) -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(DECLARATION_FILE);
        std::fs::write(&path, text).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_add_repository_dependency() {
        let (tmp, path) = write_manifest("[project]\nname = \"poet\"\n");

        add_dependency(
            &path,
            &AddOptions {
                name: "stanza-toml".to_string(),
                repository: Some("tylanphear/stanza-toml".to_string()),
                version: "latest".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        // The edited file loads and round-trips through validation.
        let project = Project::load(tmp.path()).unwrap();
        assert_eq!(project.dependencies().len(), 1);
        match project.dependencies()[0].payload() {
            DependencyPayload::Repository(repo) => {
                assert_eq!(repo.repository, "tylanphear/stanza-toml");
                assert_eq!(repo.version, "latest");
            }
            other => panic!("expected repository payload, got {:?}", other),
        }
    }

    #[test]
    fn test_add_registry_dependency_with_options() {
        let (tmp, path) = write_manifest("[project]\nname = \"poet\"\n");

        add_dependency(
            &path,
            &AddOptions {
                name: "pcre".to_string(),
                pkg: Some("pcre".to_string()),
                version: "8.45".to_string(),
                options: vec![
                    ("os".to_string(), "Linux".to_string()),
                    ("arch".to_string(), "x86_64".to_string()),
                ],
                ..Default::default()
            },
        )
        .unwrap();

        let project = Project::load(tmp.path()).unwrap();
        match project.dependencies()[0].payload() {
            DependencyPayload::Registry(reg) => {
                assert_eq!(reg.package, "pcre");
                assert_eq!(reg.options.get("os"), Some("Linux"));
                assert_eq!(reg.options.get("arch"), Some("x86_64"));
            }
            other => panic!("expected registry payload, got {:?}", other),
        }
    }

    #[test]
    fn test_add_preserves_existing_formatting() {
        let (_tmp, path) = write_manifest(
            "# bootstrap declarations\n\
             [project]\n\
             name = \"poet\"  # the consuming project\n\
             \n\
             [dependencies]\n\
             stanza-toml = { repository = \"tylanphear/stanza-toml\", version = \"latest\" }\n",
        );

        add_dependency(
            &path,
            &AddOptions {
                name: "maybe-utils".to_string(),
                repository: Some("tylanphear/maybe-utils".to_string()),
                version: "0.0.3".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let edited = std::fs::read_to_string(&path).unwrap();
        assert!(edited.contains("# bootstrap declarations"));
        assert!(edited.contains("name = \"poet\"  # the consuming project"));
        assert!(edited.contains(
            "stanza-toml = { repository = \"tylanphear/stanza-toml\", version = \"latest\" }"
        ));
        assert!(edited.contains("maybe-utils"));
    }

    #[test]
    fn test_add_rejects_both_sources() {
        let (_tmp, path) = write_manifest("[project]\nname = \"poet\"\n");

        let err = add_dependency(
            &path,
            &AddOptions {
                name: "dep".to_string(),
                repository: Some("org/dep".to_string()),
                pkg: Some("dep".to_string()),
                version: "1.0".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot name both"));
    }

    #[test]
    fn test_add_rejects_options_on_repository() {
        let (_tmp, path) = write_manifest("[project]\nname = \"poet\"\n");

        let err = add_dependency(
            &path,
            &AddOptions {
                name: "dep".to_string(),
                repository: Some("org/dep".to_string()),
                version: "1.0".to_string(),
                options: vec![("os".to_string(), "Linux".to_string())],
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot take options"));
    }
}
