//! Outcome of comparing desired and observed state.

use std::fmt;

use serde::Serialize;

/// Why a pass decided there is nothing to do.
///
/// All of these collapse to the same no-op outcome, but callers get a
/// distinguishable diagnostic instead of having to compare versions
/// themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoOpReason {
    /// Installed state already matches the request.
    Satisfied,
    /// The source cannot provide the exact pinned version.
    PinNotSatisfiable,
    /// The only available candidate is older and downgrades are disallowed.
    DowngradeRefused,
    /// No candidate version could be derived from the source.
    NoCandidate,
    /// Nothing is installed, so there is nothing to remove.
    NotInstalled,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoOpReason::Satisfied => write!(f, "already satisfied"),
            NoOpReason::PinNotSatisfiable => {
                write!(f, "pinned version not available from the source")
            }
            NoOpReason::DowngradeRefused => write!(f, "downgrade refused"),
            NoOpReason::NoCandidate => write!(f, "no candidate version in the source"),
            NoOpReason::NotInstalled => write!(f, "not installed"),
        }
    }
}

/// The minimal action that converges actual state to desired state.
///
/// Derived once per reconciliation pass, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Decision {
    /// Nothing is installed; install the target version.
    Install { version: String },
    /// An older or newer version is installed; move it to the target.
    ChangeVersion { from: String, to: String },
    /// Remove the installed package (a specific version when pinned).
    Remove { version: Option<String> },
    /// Current state stands.
    NoOp { reason: NoOpReason },
}

impl Decision {
    /// True when the decision requires invoking a backend executor.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Decision::NoOp { .. })
    }

    /// The version the pass converges to, when there is one.
    pub fn target_version(&self) -> Option<&str> {
        match self {
            Decision::Install { version } => Some(version),
            Decision::ChangeVersion { to, .. } => Some(to),
            Decision::Remove { version } => version.as_deref(),
            Decision::NoOp { .. } => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Install { version } => write!(f, "install {}", version),
            Decision::ChangeVersion { from, to } => write!(f, "change version {} -> {}", from, to),
            Decision::Remove { version: Some(v) } => write!(f, "remove {}", v),
            Decision::Remove { version: None } => write!(f, "remove"),
            Decision::NoOp { reason } => write!(f, "nothing to do ({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actionable() {
        assert!(Decision::Install {
            version: "1.0".into()
        }
        .is_actionable());
        assert!(!Decision::NoOp {
            reason: NoOpReason::Satisfied
        }
        .is_actionable());
    }

    #[test]
    fn test_display() {
        let d = Decision::ChangeVersion {
            from: "1.0".into(),
            to: "2.0".into(),
        };
        assert_eq!(d.to_string(), "change version 1.0 -> 2.0");

        let d = Decision::NoOp {
            reason: NoOpReason::DowngradeRefused,
        };
        assert_eq!(d.to_string(), "nothing to do (downgrade refused)");
    }
}
