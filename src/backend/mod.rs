//! Package backends.
//!
//! Four packaging subsystems coexist on an AIX system: RPM packages,
//! interim fixes (efixes) managed by emgr, native LPP filesets installed
//! with installp, and LPP sources served by a NIM master. Each implements
//! the same [`Backend`] interface; the kind is selected once per
//! reconciliation pass and fixed from then on.

pub mod emgr;
pub mod installp;
pub mod nimclient;
pub mod rpm;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::record::PackageRecord;
use crate::reconcile::errors::ReconcileError;

pub use emgr::EmgrBackend;
pub use installp::InstallpBackend;
pub use nimclient::NimClientBackend;
pub use rpm::RpmBackend;

/// Fixed locations of the backend primitive tools.
pub const INSTALLP: &str = "/usr/sbin/installp";
pub const LSLPP: &str = "/usr/bin/lslpp";
pub const EMGR: &str = "/usr/sbin/emgr";
pub const RPM: &str = "/usr/bin/rpm";
pub const NIMCLIENT: &str = "/usr/sbin/nimclient";

/// Every tool path this crate may invoke.
pub const ALL_TOOLS: [&str; 5] = [INSTALLP, LSLPP, EMGR, RPM, NIMCLIENT];

/// Query order when no source pins the backend: the first backend that
/// reports an installed record wins.
pub const QUERY_PROBE_ORDER: [BackendKind; 3] = [
    BackendKind::Installp,
    BackendKind::Rpm,
    BackendKind::Emgr,
];

/// The packaging subsystem a package is reconciled through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// RPM packages (`.rpm`).
    Rpm,
    /// Interim fixes managed by emgr (`.epkg.Z`).
    Emgr,
    /// Native LPP filesets installed with installp (`.bff`, images).
    Installp,
    /// LPP sources on a NIM master, installed with nimclient.
    NimClient,
}

impl BackendKind {
    /// Tools that must exist before this backend can run.
    pub fn required_tools(self) -> &'static [&'static str] {
        match self {
            BackendKind::Rpm => &[RPM],
            BackendKind::Emgr => &[EMGR],
            BackendKind::Installp => &[INSTALLP, LSLPP],
            BackendKind::NimClient => &[NIMCLIENT, LSLPP],
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Rpm => write!(f, "rpm"),
            BackendKind::Emgr => write!(f, "emgr"),
            BackendKind::Installp => write!(f, "installp"),
            BackendKind::NimClient => write!(f, "nimclient"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpm" => Ok(BackendKind::Rpm),
            "emgr" => Ok(BackendKind::Emgr),
            "installp" => Ok(BackendKind::Installp),
            "nimclient" => Ok(BackendKind::NimClient),
            other => Err(format!(
                "unknown backend `{other}` (expected rpm, emgr, installp, or nimclient)"
            )),
        }
    }
}

/// Presence of the backend tool binaries on this system.
///
/// Probed once before any reconciliation proceeds; the result is reused for
/// the whole run.
#[derive(Debug, Clone)]
pub struct Capabilities {
    missing: Vec<&'static str>,
}

impl Capabilities {
    /// Check the fixed tool paths.
    pub fn probe() -> Self {
        let missing = ALL_TOOLS
            .iter()
            .copied()
            .filter(|path| !Path::new(path).exists())
            .collect();
        Capabilities { missing }
    }

    /// Capabilities with a fixed set of present tools. Used by tests.
    pub fn with_present(present: &[&str]) -> Self {
        let missing = ALL_TOOLS
            .iter()
            .copied()
            .filter(|tool| !present.contains(tool))
            .collect();
        Capabilities { missing }
    }

    pub fn has(&self, tool: &str) -> bool {
        !self.missing.contains(&tool)
    }

    /// Tool paths absent from this system.
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    /// True when every tool the backend needs is present.
    pub fn supports(&self, kind: BackendKind) -> bool {
        kind.required_tools().iter().all(|tool| self.has(tool))
    }

    /// Fail with the enumerated missing list when the backend cannot run.
    pub fn require(&self, kind: BackendKind, name: &str) -> Result<(), ReconcileError> {
        match kind.required_tools().iter().find(|tool| !self.has(tool)) {
            None => Ok(()),
            Some(tool) => Err(ReconcileError::MissingCapability {
                backend: kind,
                name: name.to_string(),
                tool: (*tool).to_string(),
                missing: self.missing.iter().map(|s| (*s).to_string()).collect(),
            }),
        }
    }

    /// Tool presence as (path, present) pairs, for reporting.
    pub fn report(&self) -> Vec<(&'static str, bool)> {
        ALL_TOOLS.iter().map(|tool| (*tool, self.has(tool))).collect()
    }
}

/// Classify a resolved source into a backend kind.
///
/// First match wins: the `.rpm`, `.epkg.Z`, and `.bff` suffixes, then any
/// existing file or directory is treated as an installp image, and anything
/// else is assumed to be an LPP source on the NIM master. Returns `None`
/// when there is no source at all; the backend is then whichever query
/// turns up an installed record.
pub fn detect_backend(resolved: Option<&str>) -> Option<BackendKind> {
    let source = resolved.filter(|s| !s.is_empty())?;
    if source.ends_with(".rpm") {
        return Some(BackendKind::Rpm);
    }
    if source.ends_with(".epkg.Z") {
        return Some(BackendKind::Emgr);
    }
    if source.ends_with(".bff") {
        return Some(BackendKind::Installp);
    }
    let path = Path::new(source);
    if path.is_file() || path.is_dir() {
        debug!("assuming {} is an installp image", source);
        return Some(BackendKind::Installp);
    }
    debug!("assuming {} is an LPP source on the NIM master", source);
    Some(BackendKind::NimClient)
}

/// Everything an executor needs to run one install.
#[derive(Debug)]
pub struct InstallRequest<'a> {
    pub name: &'a str,
    /// Target version; empty for backends with unversioned units.
    pub version: &'a str,
    /// Local path or NIM resource name.
    pub source: &'a str,
    pub options: Option<&'a str>,
    pub current: Option<&'a PackageRecord>,
    pub allow_downgrade: bool,
    pub only_apply: bool,
}

impl InstallRequest<'_> {
    /// Version currently installed, when there is a record carrying one.
    pub(crate) fn current_version(&self) -> Option<&str> {
        self.current.and_then(|record| record.version.as_deref())
    }
}

/// One packaging subsystem behind the common reconciliation interface.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Query the system package database for an installed record.
    fn query_current(&self, name: &str) -> Result<Option<PackageRecord>, ReconcileError>;

    /// The version obtainable from the resolved source without installing.
    fn probe_candidate(&self, source: &str, name: &str)
        -> Result<Option<String>, ReconcileError>;

    /// Run the backend install primitive; returns the tool's exit status.
    fn install(&self, req: &InstallRequest<'_>) -> Result<i32, ReconcileError>;

    /// Run the backend remove primitive; returns the tool's exit status.
    fn remove(
        &self,
        name: &str,
        version: Option<&str>,
        options: Option<&str>,
    ) -> Result<i32, ReconcileError>;
}

/// Instantiate the executor for a backend kind.
pub fn backend_for(kind: BackendKind) -> Box<dyn Backend> {
    match kind {
        BackendKind::Rpm => Box::new(RpmBackend),
        BackendKind::Emgr => Box::new(EmgrBackend),
        BackendKind::Installp => Box::new(InstallpBackend),
        BackendKind::NimClient => Box::new(NimClientBackend),
    }
}

/// Split a pass-through options string into argv entries.
pub(crate) fn split_options<'a>(options: Option<&'a str>) -> impl Iterator<Item = &'a str> + 'a {
    options.unwrap_or("").split_whitespace()
}
