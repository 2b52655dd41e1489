//! Registry artifact identity.
//!
//! An [`ArtifactRef`] is the progressively-qualified identity of a
//! binary package in the registry. A bare `name/version` pair is
//! loosely specified; resolution pins it down through a recipe
//! revision and a package id to a package revision. Only a reference
//! with all three is *fully qualified*, i.e. names one exact binary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing an artifact reference string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefParseError {
    #[error("artifact reference '{0}' is missing a package name")]
    MissingName(String),

    #[error("artifact reference '{0}' is missing a version")]
    MissingVersion(String),
}

/// A progressively-qualified registry artifact identity.
///
/// String form: `name/version[#recipe_revision][:package_id[#package_revision]]`,
/// where only `name/version` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    name: String,
    version: String,
    recipe_revision: Option<String>,
    package_id: Option<String>,
    package_revision: Option<String>,
}

impl ArtifactRef {
    /// Create a loosely-specified reference from a name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ArtifactRef {
            name: name.into(),
            version: version.into(),
            recipe_revision: None,
            package_id: None,
            package_revision: None,
        }
    }

    /// Pin the recipe revision.
    pub fn with_recipe_revision(mut self, rrev: impl Into<String>) -> Self {
        self.recipe_revision = Some(rrev.into());
        self
    }

    /// Pin the package id.
    pub fn with_package_id(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }

    /// Pin the package revision.
    pub fn with_package_revision(mut self, prev: impl Into<String>) -> Self {
        self.package_revision = Some(prev.into());
        self
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the package version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the recipe revision, if pinned.
    pub fn recipe_revision(&self) -> Option<&str> {
        self.recipe_revision.as_deref()
    }

    /// Get the package id, if pinned.
    pub fn package_id(&self) -> Option<&str> {
        self.package_id.as_deref()
    }

    /// Get the package revision, if pinned.
    pub fn package_revision(&self) -> Option<&str> {
        self.package_revision.as_deref()
    }

    /// Whether all three revision components are pinned.
    pub fn is_fully_qualified(&self) -> bool {
        self.recipe_revision.is_some()
            && self.package_id.is_some()
            && self.package_revision.is_some()
    }
}

impl FromStr for ArtifactRef {
    type Err = RefParseError;

    /// Parse `name/version[#rrev][:pkgid[#prev]]`.
    ///
    /// Splits are first-occurrence: the name ends at the first `/`,
    /// the package-id section starts at the first `:`, and each `#`
    /// separates a component from its revision. Absent components
    /// stay unpinned.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s.split_once('/').unwrap_or((s, ""));
        if name.is_empty() {
            return Err(RefParseError::MissingName(s.to_string()));
        }

        let (ver_part, pkg_part) = rest.split_once(':').unwrap_or((rest, ""));
        let (version, rrev) = ver_part.split_once('#').unwrap_or((ver_part, ""));
        let (pkg_id, prev) = pkg_part.split_once('#').unwrap_or((pkg_part, ""));

        if version.is_empty() {
            return Err(RefParseError::MissingVersion(s.to_string()));
        }

        let non_empty = |part: &str| (!part.is_empty()).then(|| part.to_string());
        Ok(ArtifactRef {
            name: name.to_string(),
            version: version.to_string(),
            recipe_revision: non_empty(rrev),
            package_id: non_empty(pkg_id),
            package_revision: non_empty(prev),
        })
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some(ref rrev) = self.recipe_revision {
            write!(f, "#{}", rrev)?;
        }
        if let Some(ref pkg_id) = self.package_id {
            write!(f, ":{}", pkg_id)?;
            if let Some(ref prev) = self.package_revision {
                write!(f, "#{}", prev)?;
            }
        }
        Ok(())
    }
}

/// An ordered set of build options or settings (`key=value` pairs).
///
/// Ordered so that diagnostics and logs print deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet(BTreeMap<String, String>);

impl OptionSet {
    /// Create an empty option set.
    pub fn new() -> Self {
        OptionSet::default()
    }

    /// Insert an option, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get an option value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of options in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Overlay another set on top of this one; the overlay wins on
    /// conflicting keys.
    pub fn merged_with<'a>(
        &self,
        overlay: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        let mut merged = self.clone();
        for (k, v) in overlay {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OptionSet(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(none)");
        }
        let mut first = true;
        for (k, v) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_version_only() {
        let r: ArtifactRef = "pcre/8.45".parse().unwrap();
        assert_eq!(r.name(), "pcre");
        assert_eq!(r.version(), "8.45");
        assert_eq!(r.recipe_revision(), None);
        assert_eq!(r.package_id(), None);
        assert_eq!(r.package_revision(), None);
        assert!(!r.is_fully_qualified());
    }

    #[test]
    fn test_parse_fully_qualified() {
        let r: ArtifactRef = "pcre/8.45#125d5f684fea10391ff4cbcd809a5c74:22df55d12fd0a729491762b4508bc4ddf8b50a38#5a5560f797885024ff7e6a48b3b7543e"
            .parse()
            .unwrap();
        assert_eq!(r.name(), "pcre");
        assert_eq!(r.version(), "8.45");
        assert_eq!(r.recipe_revision(), Some("125d5f684fea10391ff4cbcd809a5c74"));
        assert_eq!(
            r.package_id(),
            Some("22df55d12fd0a729491762b4508bc4ddf8b50a38")
        );
        assert_eq!(
            r.package_revision(),
            Some("5a5560f797885024ff7e6a48b3b7543e")
        );
        assert!(r.is_fully_qualified());
    }

    #[test]
    fn test_parse_partial_forms() {
        let r: ArtifactRef = "zlib/1.2.13#abc".parse().unwrap();
        assert_eq!(r.recipe_revision(), Some("abc"));
        assert_eq!(r.package_id(), None);

        let r: ArtifactRef = "zlib/1.2.13#abc:def".parse().unwrap();
        assert_eq!(r.package_id(), Some("def"));
        assert_eq!(r.package_revision(), None);
        assert!(!r.is_fully_qualified());
    }

    #[test]
    fn test_parse_rejects_empty_components() {
        assert_eq!(
            "/1.0".parse::<ArtifactRef>(),
            Err(RefParseError::MissingName("/1.0".to_string()))
        );
        assert_eq!(
            "pcre".parse::<ArtifactRef>(),
            Err(RefParseError::MissingVersion("pcre".to_string()))
        );
        assert_eq!(
            "pcre/".parse::<ArtifactRef>(),
            Err(RefParseError::MissingVersion("pcre/".to_string()))
        );
    }

    #[test]
    fn test_display_round_trip() {
        for s in [
            "pcre/8.45",
            "pcre/8.45#aaaa",
            "pcre/8.45#aaaa:bbbb",
            "pcre/8.45#aaaa:bbbb#cccc",
        ] {
            let r: ArtifactRef = s.parse().unwrap();
            assert_eq!(r.to_string(), s);
        }
    }

    #[test]
    fn test_display_hides_orphan_package_revision() {
        // A package revision without a package id has no position in
        // the string form.
        let r = ArtifactRef::new("pcre", "8.45").with_package_revision("cccc");
        assert_eq!(r.to_string(), "pcre/8.45");
    }

    #[test]
    fn test_qualification_builders() {
        let r = ArtifactRef::new("pcre", "8.45")
            .with_recipe_revision("aaaa")
            .with_package_id("bbbb")
            .with_package_revision("cccc");
        assert!(r.is_fully_qualified());
        assert_eq!(r.to_string(), "pcre/8.45#aaaa:bbbb#cccc");
    }

    #[test]
    fn test_option_set_display() {
        let mut opts = OptionSet::new();
        opts.insert("os", "Linux");
        opts.insert("arch", "x86_64");

        // Keys print in sorted order.
        assert_eq!(opts.to_string(), "arch=x86_64, os=Linux");
        assert_eq!(OptionSet::new().to_string(), "(none)");
    }

    #[test]
    fn test_option_set_merge_overlay_wins() {
        let mut base = OptionSet::new();
        base.insert("os", "Linux");
        base.insert("shared", "False");

        let mut overlay = std::collections::BTreeMap::new();
        overlay.insert("shared".to_string(), "True".to_string());
        overlay.insert("fPIC".to_string(), "True".to_string());

        let merged = base.merged_with(&overlay);
        assert_eq!(merged.get("os"), Some("Linux"));
        assert_eq!(merged.get("shared"), Some("True"));
        assert_eq!(merged.get("fPIC"), Some("True"));
        assert_eq!(base.get("shared"), Some("False"));
    }
}
