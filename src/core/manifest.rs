//! Declarative package manifests.
//!
//! A manifest is the file-based way to feed desired state to the
//! reconciler: one TOML document, one `[[package]]` table per package.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::backend::BackendKind;
use crate::core::spec::PackageSpec;
use crate::reconcile::Action;

/// A TOML file declaring the desired state of a set of packages.
///
/// Entries reconcile independently, in file order:
///
/// ```toml
/// [[package]]
/// name = "openssh.base.server"
/// source = "/export/lpp/openssh"
/// version = "9.2.102.2400"
///
/// [[package]]
/// name = "IV12345s01"
/// source = "https://fixes.example.com/IV12345s01.epkg.Z"
///
/// [[package]]
/// name = "cdrecord"
/// action = "remove"
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageEntry>,
}

/// One desired-state entry: the spec fields plus the action verb.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub backend: Option<BackendKind>,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub allow_downgrade: bool,
    #[serde(default)]
    pub only_apply: bool,
    #[serde(default)]
    pub action: Action,
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest content.
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(content).context("failed to parse package manifest")?;
        Ok(manifest)
    }
}

impl PackageEntry {
    /// The desired-state spec for this entry.
    pub fn spec(&self) -> PackageSpec {
        PackageSpec {
            name: self.name.clone(),
            version: self.version.clone(),
            source: self.source.clone(),
            backend: self.backend,
            options: self.options.clone(),
            allow_downgrade: self.allow_downgrade,
            only_apply: self.only_apply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(
            r#"
            [[package]]
            name = "openssh.base.server"
            source = "/export/lpp/openssh"
            version = "9.2.102.2400"

            [[package]]
            name = "IV12345s01"
            source = "https://fixes.example.com/IV12345s01.epkg.Z"
            only_apply = true

            [[package]]
            name = "cdrecord"
            backend = "rpm"
            action = "remove"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.packages.len(), 3);

        let ssh = &manifest.packages[0];
        assert_eq!(ssh.action, Action::Install);
        assert_eq!(ssh.spec().pinned_version(), Some("9.2.102.2400"));

        let efix = &manifest.packages[1];
        assert!(efix.only_apply);

        let rpm = &manifest.packages[2];
        assert_eq!(rpm.backend, Some(BackendKind::Rpm));
        assert_eq!(rpm.action, Action::Remove);
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let err = Manifest::parse(
            r#"
            [[package]]
            name = "util"
            verison = "1.0"
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("verison"));
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("").unwrap();
        assert!(manifest.packages.is_empty());
    }
}
