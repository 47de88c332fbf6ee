//! Observed installed state of a single package.

use serde::Serialize;

/// Commit state a backend reports for an installed object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Permanently committed (`C`).
    Committed,
    /// Applied but not yet committed (`A`).
    Applied,
    /// Any other backend-specific code, kept verbatim.
    Other(String),
}

impl RecordState {
    pub fn from_code(code: &str) -> Self {
        match code {
            "C" => RecordState::Committed,
            "A" => RecordState::Applied,
            other => RecordState::Other(other.to_string()),
        }
    }
}

/// One installed package as reported by a backend query.
///
/// Populated by exactly one current-state query per reconciliation pass and
/// read-only afterwards. Never cached across passes; the package database of
/// the target system is re-read every time because it can change outside
/// this reconciler's control.
#[derive(Debug, Clone, Serialize)]
pub struct PackageRecord {
    /// Canonical name as the backend reports it (fileset name, efix label).
    pub name: String,
    /// Installed version; `None` would mean "present but unversioned".
    pub version: Option<String>,
    pub state: RecordState,
    pub description: String,
    /// True when an efix holds an exclusivity lock on this package.
    pub locked: bool,
    pub install_path: String,
    pub build_date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes() {
        assert_eq!(RecordState::from_code("C"), RecordState::Committed);
        assert_eq!(RecordState::from_code("A"), RecordState::Applied);
        assert_eq!(
            RecordState::from_code("S"),
            RecordState::Other("S".to_string())
        );
    }
}
