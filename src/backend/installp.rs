//! installp (native LPP fileset) backend.
//!
//! Installed state comes from `lslpp -Lc`, whose colon-separated records
//! include the lock flag an applied efix leaves on a fileset. A locked
//! fileset must be unlocked (its efixes removed) before installp can touch
//! it.

use tracing::{debug, error};

use crate::core::record::{PackageRecord, RecordState};
use crate::reconcile::errors::ReconcileError;
use crate::util::process::ProcessBuilder;

use super::{emgr, split_options, Backend, BackendKind, InstallRequest, INSTALLP, LSLPP};

pub struct InstallpBackend;

impl Backend for InstallpBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Installp
    }

    fn query_current(&self, name: &str) -> Result<Option<PackageRecord>, ReconcileError> {
        query_lslpp(name)
    }

    fn probe_candidate(
        &self,
        source: &str,
        name: &str,
    ) -> Result<Option<String>, ReconcileError> {
        let out = ProcessBuilder::new(INSTALLP).args(["-Ld", source]).exec()?;
        debug!("installp -Ld {}: exit {}", source, out.code());
        if out.code() != 0 {
            return Ok(None);
        }
        // A source can hold several levels of the same fileset; the last
        // row is the newest.
        let needle = format!(":{name}:");
        Ok(out
            .stdout
            .lines()
            .filter(|line| line.contains(&needle))
            .last()
            .and_then(|line| line.split(':').nth(2))
            .map(str::to_string))
    }

    fn install(&self, req: &InstallRequest<'_>) -> Result<i32, ReconcileError> {
        unlock_if_locked(req)?;

        let mut cmd = ProcessBuilder::new(INSTALLP).arg(apply_flags(req.only_apply, req.allow_downgrade));
        if req.current_version().is_some() && req.allow_downgrade {
            cmd = cmd.arg("-F");
        }
        let out = cmd
            .args(split_options(req.options))
            .args(["-d", req.source, req.name, req.version])
            .exec()?;
        debug!("{}", out.stdout);
        if out.code() != 0 {
            error!(
                "installp install of {} failed: {}",
                req.name,
                out.stderr.trim_end()
            );
        }
        Ok(out.code())
    }

    fn remove(
        &self,
        name: &str,
        version: Option<&str>,
        _options: Option<&str>,
    ) -> Result<i32, ReconcileError> {
        let mut cmd = ProcessBuilder::new(INSTALLP).args(["-u", name]);
        if let Some(version) = version {
            cmd = cmd.arg(version);
        }
        let out = cmd.exec()?;
        if out.code() != 0 {
            error!("installp remove of {} failed: {}", name, out.stderr.trim_end());
        }
        Ok(out.code())
    }
}

/// Clear efix locks before touching an installed fileset.
pub(crate) fn unlock_if_locked(req: &InstallRequest<'_>) -> Result<(), ReconcileError> {
    let locked = req.current.is_some_and(|record| record.locked);
    if !locked {
        return Ok(());
    }
    debug!("{} is locked by emgr, unlocking", req.name);
    emgr::unlock(req.name).map_err(|source| ReconcileError::Locked {
        name: req.name.to_string(),
        source: Box::new(source),
    })
}

/// installp apply flags: commit unless only applying, auto-answer yes, and
/// either reject down-level installs (`g`) or force them (`F`).
pub(crate) fn apply_flags(only_apply: bool, allow_downgrade: bool) -> String {
    let mut flags = String::from("-a");
    if !only_apply {
        flags.push('c');
    }
    flags.push('Y');
    flags.push(if allow_downgrade { 'F' } else { 'g' });
    flags
}

/// Query the LPP database for one fileset via `lslpp -Lc`.
///
/// The first output line is a header; the record of interest is the second
/// line, colon-separated: fileset name (1), level (2), state (5),
/// description (6), lock flag (15), install path (16), build date (17).
pub(crate) fn query_lslpp(name: &str) -> Result<Option<PackageRecord>, ReconcileError> {
    let out = ProcessBuilder::new(LSLPP).args(["-Lc", name]).exec()?;
    debug!("lslpp -Lc {}: exit {}", name, out.code());
    if out.code() != 0 {
        return Ok(None);
    }
    Ok(parse_lslpp(&out.stdout))
}

fn parse_lslpp(stdout: &str) -> Option<PackageRecord> {
    let line = stdout.lines().nth(1)?;
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < 18 {
        return None;
    }
    Some(PackageRecord {
        name: fields[1].to_string(),
        version: Some(fields[2].to_string()),
        state: RecordState::from_code(fields[5]),
        description: fields[6].to_string(),
        locked: fields[15] == "1",
        install_path: fields[16].to_string(),
        build_date: fields[17].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Header line, then one colon-separated record with the level at
    // field 2, state 5, description 6, lock flag 15, path 16, date 17.
    const LSLPP_ROW: &str = "\
#Package Name:Fileset:Level:State:PTF Id:Fix State:Type:Description:EFIX Locked\n\
openssh.base:openssh.base.server:9.2.102.2400: : :C:Open Secure Shell Server: : : : : : : : :0:/:2412\n";

    #[test]
    fn test_parse_lslpp() {
        let record = parse_lslpp(LSLPP_ROW).unwrap();
        assert_eq!(record.name, "openssh.base.server");
        assert_eq!(record.version.as_deref(), Some("9.2.102.2400"));
        assert_eq!(record.state, RecordState::Committed);
        assert_eq!(record.description, "Open Secure Shell Server");
        assert!(!record.locked);
        assert_eq!(record.install_path, "/");
        assert_eq!(record.build_date, "2412");
    }

    #[test]
    fn test_parse_lslpp_locked_flag() {
        let row = LSLPP_ROW.replace(":0:/:2412", ":1:/usr:2412");
        let record = parse_lslpp(&row).unwrap();
        assert!(record.locked);
        assert_eq!(record.install_path, "/usr");
    }

    #[test]
    fn test_parse_lslpp_needs_second_line() {
        assert!(parse_lslpp("#Package Name:Fileset:Level\n").is_none());
        assert!(parse_lslpp("").is_none());
    }

    #[test]
    fn test_apply_flags() {
        assert_eq!(apply_flags(false, false), "-acYg");
        assert_eq!(apply_flags(true, false), "-aYg");
        assert_eq!(apply_flags(false, true), "-acYF");
        assert_eq!(apply_flags(true, true), "-aYF");
    }
}
