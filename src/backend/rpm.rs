//! RPM backend.
//!
//! Queries the RPM database with `--queryformat` so the output is a fixed
//! colon-separated record rather than free text.

use tracing::{debug, error};

use crate::core::record::{PackageRecord, RecordState};
use crate::reconcile::errors::ReconcileError;
use crate::util::process::ProcessBuilder;

use super::{split_options, Backend, BackendKind, InstallRequest, RPM};

const QUERY_FORMAT: &str = "%{NAME}:%{VERSION}-%{RELEASE}:%{SUMMARY}:%{BUILDTIME}\n";
const PROBE_FORMAT: &str = "%{VERSION}-%{RELEASE}\n";

pub struct RpmBackend;

impl Backend for RpmBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Rpm
    }

    fn query_current(&self, name: &str) -> Result<Option<PackageRecord>, ReconcileError> {
        let out = ProcessBuilder::new(RPM)
            .args(["-q", "--queryformat", QUERY_FORMAT, name])
            .exec()?;
        debug!("rpm -q {}: exit {}", name, out.code());
        if out.code() != 0 {
            return Ok(None);
        }
        Ok(parse_query_line(out.stdout.lines().next().unwrap_or("")))
    }

    fn probe_candidate(
        &self,
        source: &str,
        _name: &str,
    ) -> Result<Option<String>, ReconcileError> {
        let out = ProcessBuilder::new(RPM)
            .args(["-q", "--queryformat", PROBE_FORMAT, "-p", source])
            .exec()?;
        debug!("rpm -q -p {}: exit {}", source, out.code());
        if out.code() != 0 {
            return Ok(None);
        }
        Ok(out.stdout.lines().next().map(str::to_string))
    }

    fn install(&self, req: &InstallRequest<'_>) -> Result<i32, ReconcileError> {
        let out = if req.current_version().is_none() {
            ProcessBuilder::new(RPM)
                .arg("-i")
                .args(split_options(req.options))
                .arg(req.source)
                .exec()?
        } else if req.allow_downgrade {
            ProcessBuilder::new(RPM)
                .args(["-U", "--oldpackage"])
                .arg(req.source)
                .exec()?
        } else {
            ProcessBuilder::new(RPM).arg("-U").arg(req.source).exec()?
        };
        if out.code() != 0 {
            error!("rpm install of {} failed: {}", req.name, out.stderr.trim_end());
        }
        Ok(out.code())
    }

    fn remove(
        &self,
        name: &str,
        version: Option<&str>,
        options: Option<&str>,
    ) -> Result<i32, ReconcileError> {
        let out = match version {
            Some(version) => ProcessBuilder::new(RPM)
                .arg("-e")
                .args(split_options(options))
                .arg(format!("{name}-{version}"))
                .exec()?,
            None => ProcessBuilder::new(RPM)
                .args(["-e", "--allmatches"])
                .args(split_options(options))
                .arg(name)
                .exec()?,
        };
        if out.code() != 0 {
            error!("rpm remove of {} failed: {}", name, out.stderr.trim_end());
        }
        Ok(out.code())
    }
}

/// Parse one `--queryformat` record: NAME:VERSION-RELEASE:SUMMARY:BUILDTIME.
fn parse_query_line(line: &str) -> Option<PackageRecord> {
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < 4 {
        return None;
    }
    Some(PackageRecord {
        name: fields[0].to_string(),
        version: Some(fields[1].to_string()),
        // The RPM database has no applied/committed distinction.
        state: RecordState::Committed,
        description: fields[2].to_string(),
        // RPM packages cannot be locked by emgr.
        locked: false,
        install_path: "/".to_string(),
        build_date: fields[3].to_string(),
    })
}
