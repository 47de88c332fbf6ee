//! emgr (interim fix) backend.
//!
//! Efixes are unversioned, individually removable patch units. An applied
//! efix can lock the filesets it touches, which blocks both other efixes
//! and installp updates until it is removed; the helpers here discover and
//! clear those locks.

use tracing::{debug, error, warn};

use crate::core::record::{PackageRecord, RecordState};
use crate::reconcile::errors::ReconcileError;
use crate::util::process::ProcessBuilder;

use super::{Backend, BackendKind, InstallRequest, EMGR};

/// Diagnostic code emgr emits when an efix is blocked by an applied one.
const BLOCKED_BY_EFIX: &str = "0645-070";

pub struct EmgrBackend;

impl Backend for EmgrBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Emgr
    }

    fn query_current(&self, name: &str) -> Result<Option<PackageRecord>, ReconcileError> {
        let out = ProcessBuilder::new(EMGR).args(["-lL", name]).exec()?;
        debug!("emgr -lL {}: exit {}", name, out.code());
        if out.code() != 0 {
            return Ok(None);
        }
        Ok(parse_listing(&out.stdout))
    }

    fn probe_candidate(
        &self,
        _source: &str,
        _name: &str,
    ) -> Result<Option<String>, ReconcileError> {
        // Efixes carry no version of their own; an applied efix is level 1.
        Ok(Some("1".to_string()))
    }

    fn install(&self, req: &InstallRequest<'_>) -> Result<i32, ReconcileError> {
        if req.current_version().is_some() {
            return Ok(0);
        }

        // Preview first to find out whether the efix can go on at all.
        let preview = ProcessBuilder::new(EMGR)
            .args(["-e", req.source, "-p"])
            .exec()?;
        if preview.code() != 0 {
            let blockers = blocking_efixes(&preview.stderr);
            if blockers.is_empty() {
                warn!("emgr preview failed and reported no blocking efixes");
                error!("{}", preview.stderr.trim_end());
                return Ok(preview.code());
            }
            warn!("efixes blocking {}: {}", req.name, blockers.join(", "));
            for label in &blockers {
                warn!("removing blocking efix {}", label);
                let status = self.remove(label, None, None)?;
                if status != 0 {
                    return Err(ReconcileError::BlockerRemoval {
                        label: label.clone(),
                        status,
                    });
                }
            }
            debug!("all blocking efixes removed");
        }

        let out = ProcessBuilder::new(EMGR).args(["-e", req.source]).exec()?;
        if out.code() != 0 {
            error!("emgr install of {} failed: {}", req.name, out.stderr.trim_end());
        }
        Ok(out.code())
    }

    fn remove(
        &self,
        name: &str,
        _version: Option<&str>,
        _options: Option<&str>,
    ) -> Result<i32, ReconcileError> {
        let out = ProcessBuilder::new(EMGR).args(["-rL", name]).exec()?;
        debug!("emgr -rL {}: exit {}", name, out.code());
        Ok(out.code())
    }
}

/// Remove every efix locking `name`.
///
/// Walks `emgr -l -v3` for EFIX LABEL / PACKAGE pairs and removes each
/// owning efix. A failed listing or a failed removal aborts immediately.
pub(crate) fn unlock(name: &str) -> Result<(), ReconcileError> {
    let out = ProcessBuilder::new(EMGR).args(["-l", "-v3"]).exec()?;
    if out.code() != 0 {
        warn!("{}", out.stderr.trim_end());
        return Err(ReconcileError::LockQuery {
            status: out.code(),
            stderr: out.stderr,
        });
    }
    let labels = owning_efixes(&out.stdout, name);
    debug!("efixes locking {}: {:?}", name, labels);
    for label in &labels {
        let status = ProcessBuilder::new(EMGR).args(["-rL", label]).exec()?.code();
        if status != 0 {
            return Err(ReconcileError::BlockerRemoval {
                label: label.clone(),
                status,
            });
        }
    }
    Ok(())
}

/// First numbered row of an `emgr -lL` listing.
///
/// Rows look like `1  S  IV12345s01  02/17/14 10:35:32  fix oslevel`.
fn parse_listing(stdout: &str) -> Option<PackageRecord> {
    let line = stdout
        .lines()
        .find(|line| line.starts_with(|c: char| ('1'..='9').contains(&c)))?;
    let mut fields = line.split_whitespace();
    let _id = fields.next()?;
    let state = fields.next()?;
    let label = fields.next()?;
    let date = fields.next().unwrap_or("");
    let time = fields.next().unwrap_or("");
    let abstract_text = fields.collect::<Vec<_>>().join(" ");
    Some(PackageRecord {
        name: label.to_string(),
        version: Some("1".to_string()),
        state: RecordState::from_code(state),
        description: abstract_text,
        // The listing reports the efix itself, not a lock on it.
        locked: false,
        install_path: "/".to_string(),
        build_date: format!("{date} {time}"),
    })
}

/// Labels of applied efixes named in `0645-070` diagnostics.
fn blocking_efixes(stderr: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for line in stderr.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.get(1) != Some(&BLOCKED_BY_EFIX) {
            continue;
        }
        let Some(last) = tokens.last() else { continue };
        let label: String = last
            .chars()
            .filter(|c| !matches!(c, '"' | '.' | ' '))
            .collect();
        if !label.is_empty() && !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels
}

/// Labels of efixes whose lock list contains `package`, from `emgr -l -v3`
/// output.
fn owning_efixes(stdout: &str, package: &str) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    let mut current = String::new();
    for line in stdout.lines() {
        if line.starts_with("EFIX LABEL:") {
            current = line
                .split_whitespace()
                .nth(2)
                .unwrap_or("")
                .to_string();
        } else if line.trim_start().starts_with("PACKAGE:") {
            let owner = line.split_whitespace().nth(1);
            if owner == Some(package) && !current.is_empty() && !labels.contains(&current) {
                labels.push(current.clone());
            }
        }
    }
    labels
}
