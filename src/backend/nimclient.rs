//! nimclient (NIM lpp_source) backend.
//!
//! Same fileset semantics as installp, but the install source is a named
//! lpp_source resource on the NIM master instead of a local path, so the
//! candidate probe and the install go through `nimclient` operations.

use tracing::{debug, error};

use crate::core::record::PackageRecord;
use crate::reconcile::errors::ReconcileError;
use crate::util::process::ProcessBuilder;

use super::installp::{apply_flags, query_lslpp, unlock_if_locked};
use super::{Backend, BackendKind, InstallRequest, NIMCLIENT};

pub struct NimClientBackend;

impl Backend for NimClientBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NimClient
    }

    fn query_current(&self, name: &str) -> Result<Option<PackageRecord>, ReconcileError> {
        // Installed state lives in the local LPP database either way.
        query_lslpp(name)
    }

    fn probe_candidate(
        &self,
        source: &str,
        name: &str,
    ) -> Result<Option<String>, ReconcileError> {
        let out = ProcessBuilder::new(NIMCLIENT)
            .args(["-o", "showres", "-a", "installp_flags=-L", "-a"])
            .arg(format!("resource={source}"))
            .exec()?;
        debug!("nimclient showres {}: exit {}", source, out.code());
        if out.code() != 0 {
            error!("{}", out.stderr.trim_end());
            return Ok(None);
        }
        let needle = format!(":{name}");
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

        let flags = apply_flags(req.only_apply, req.allow_downgrade);
        debug!("allow_downgrade = {}", req.allow_downgrade);
        let out = ProcessBuilder::new(NIMCLIENT)
            .args(["-o", "cust", "-a"])
            .arg(format!("lpp_source={}", req.source))
            .arg("-a")
            .arg(format!("filesets={} {}", req.name, req.version))
            .arg("-a")
            .arg(format!(
                "installp_flags={}{}",
                flags,
                req.options.unwrap_or("")
            ))
            .exec()?;
        debug!("{}", out.stdout);
        if out.code() != 0 {
            error!(
                "nimclient install of {} failed: {}",
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
        options: Option<&str>,
    ) -> Result<i32, ReconcileError> {
        // Removal of an installed fileset is a local installp operation.
        super::InstallpBackend.remove(name, version, options)
    }
}
