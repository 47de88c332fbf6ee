//! Desired-state description of a single package.

use crate::backend::BackendKind;

/// What one package on the target system should look like.
///
/// A spec is paired with at most one observed [`PackageRecord`] per
/// reconciliation pass and never changes during the pass.
///
/// [`PackageRecord`]: crate::core::record::PackageRecord
#[derive(Debug, Clone)]
pub struct PackageSpec {
    /// Package, fileset, or efix label.
    pub name: String,
    /// Exact version pin. Absent or empty means "whatever the source provides".
    pub version: Option<String>,
    /// Local path, `http(s)://`/`ftp://` locator, or NIM resource name.
    pub source: Option<String>,
    /// Backend override. Absent means detect from the source.
    pub backend: Option<BackendKind>,
    /// Extra flags passed through verbatim to the backend tool.
    pub options: Option<String>,
    /// Permit replacing an installed version with an older one.
    pub allow_downgrade: bool,
    /// installp/nimclient only: apply the fileset without committing it.
    pub only_apply: bool,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        PackageSpec {
            name: name.into(),
            version: None,
            source: None,
            backend: None,
            options: None,
            allow_downgrade: false,
            only_apply: false,
        }
    }

    /// The requested version, if one was pinned (non-empty).
    pub fn pinned_version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }

    /// The source locator, if one was configured (non-empty).
    pub fn configured_source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pin_is_no_pin() {
        let mut spec = PackageSpec::new("bos.rte");
        assert_eq!(spec.pinned_version(), None);

        spec.version = Some(String::new());
        assert_eq!(spec.pinned_version(), None);

        spec.version = Some("7.2.0.0".to_string());
        assert_eq!(spec.pinned_version(), Some("7.2.0.0"));
    }
}
