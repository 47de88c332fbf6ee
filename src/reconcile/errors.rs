//! Error taxonomy for reconciliation passes.
//!
//! Precondition and specification failures are fatal and never retried;
//! tool failures carry the backend's raw exit status and are left to the
//! caller's retry policy. Silent no-ops (pin mismatch, refused downgrade)
//! are not errors; they surface as [`Decision::NoOp`] with a reason.
//!
//! [`Decision::NoOp`]: crate::core::decision::Decision

use thiserror::Error;

use crate::backend::BackendKind;
use crate::util::process::SpawnError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A backend was selected but its tool binaries are absent.
    #[error("backend {backend} is unavailable for `{name}`: `{tool}` not found (missing tools: {})", .missing.join(", "))]
    MissingCapability {
        backend: BackendKind,
        name: String,
        tool: String,
        missing: Vec<String>,
    },

    /// Source matched no suffix, no filesystem entry, and the NIM fallback
    /// is unavailable too.
    #[error("could not determine the package type of `{source_spec}` (missing tools: {})", .missing.join(", "))]
    DetectionFailed { source_spec: String, missing: Vec<String> },

    /// No source is configured and nothing is installed: there is no way
    /// to derive an install candidate.
    #[error("cannot determine an install candidate for `{name}`: no source configured and no installed record found")]
    NoCandidate { name: String },

    /// Remove was requested for a package whose backend could not be
    /// determined.
    #[error("don't know how to remove `{name}`: no backend reports it as installed")]
    UnknownRemoval { name: String },

    /// Remote source retrieval failed.
    #[error("failed to fetch `{locator}`: {message}")]
    Fetch { locator: String, message: String },

    /// A backend tool could not be launched at all.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// The package is locked by an efix and unlocking it failed.
    #[error("package `{name}` is locked by emgr")]
    Locked {
        name: String,
        #[source]
        source: Box<ReconcileError>,
    },

    /// Listing applied efixes (`emgr -l -v3`) failed.
    #[error("listing applied efixes failed with status {status}: {stderr}")]
    LockQuery { status: i32, stderr: String },

    /// Removing a blocking or locking efix failed; the cascade stops here.
    #[error("removing efix `{label}` failed with status {status}")]
    BlockerRemoval { label: String, status: i32 },

    /// An install or remove primitive exited non-zero.
    #[error("{backend} {operation} of `{name}` failed with status {status}")]
    ToolFailure {
        backend: BackendKind,
        operation: &'static str,
        name: String,
        status: i32,
    },
}
