//! The reconciliation pass: query, decide, act.
//!
//! One pass handles one named package against one target system. It
//! resolves the source, fixes the backend for the pass, queries live
//! installed state, decides the minimal converging action, and (unless
//! checking) executes it through the backend. Nothing is cached between
//! passes: the package database can change outside this reconciler's
//! control, so every pass re-reads it.

pub mod errors;
pub mod version;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{
    backend_for, detect_backend, Backend, BackendKind, Capabilities, InstallRequest,
    QUERY_PROBE_ORDER,
};
use crate::core::decision::{Decision, NoOpReason};
use crate::core::record::PackageRecord;
use crate::core::spec::PackageSpec;
use crate::sources::{resolve_source, FetchOptions, ResolvedSource};

use errors::ReconcileError;
use version::compare_versions;

/// Action verb accepted from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Install,
    /// Converge to the newest candidate. Identical to install here: the
    /// diff engine already moves an installed package to the candidate.
    Upgrade,
    Remove,
    /// Remove; these backends keep no configuration leftovers to purge.
    Purge,
    /// Decide only; never invoke an executor.
    Check,
}

/// What one reconciliation pass concluded and, unless checking, did.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub name: String,
    /// Backend the pass settled on. `None` when nothing pinned it and no
    /// query found an installed record.
    pub backend: Option<BackendKind>,
    /// Installed record found by the current-state query.
    pub current: Option<PackageRecord>,
    pub decision: Decision,
    /// True when an executor ran and exited zero.
    pub executed: bool,
}

/// Run one reconciliation pass for the given action.
pub fn reconcile(
    spec: &PackageSpec,
    action: Action,
    caps: &Capabilities,
    fetch: FetchOptions,
) -> Result<Outcome, ReconcileError> {
    let prepared = prepare(spec, caps, fetch)?;
    match action {
        Action::Install | Action::Upgrade => run_install(spec, prepared, true),
        Action::Check => run_install(spec, prepared, false),
        Action::Remove | Action::Purge => run_remove(spec, prepared),
    }
}

/// Read-only pass: resolve, detect, query, decide. Never executes.
pub fn check(
    spec: &PackageSpec,
    caps: &Capabilities,
    fetch: FetchOptions,
) -> Result<Outcome, ReconcileError> {
    reconcile(spec, Action::Check, caps, fetch)
}

/// Decide the minimal install-converging action.
///
/// `candidate` is the version the backend probe derived from the resolved
/// source. Pure function of its inputs. The downgrade gate runs twice, once
/// against the raw candidate and once against the final target, because the
/// pin handling in between can change what the target is.
pub fn plan(
    spec: &PackageSpec,
    current: Option<&PackageRecord>,
    candidate: Option<&str>,
) -> Result<Decision, ReconcileError> {
    if spec.configured_source().is_none() && current.is_none() {
        return Err(ReconcileError::NoCandidate {
            name: spec.name.clone(),
        });
    }

    let current_version = current.and_then(|record| record.version.as_deref());
    let mut candidate = candidate.filter(|v| !v.is_empty()).map(str::to_string);
    let mut reason = NoOpReason::NoCandidate;

    // Never silently downgrade: a candidate older than the installed
    // version is discarded outright.
    if let (Some(_), Some(cand)) = (current_version, candidate.as_deref()) {
        if compare_versions(Some(cand), current_version) == Ordering::Less
            && !spec.allow_downgrade
        {
            debug!(
                "candidate {} is older than installed {}, discarding",
                cand,
                current_version.unwrap_or("")
            );
            candidate = None;
            reason = NoOpReason::DowngradeRefused;
        }
    }

    // An explicit pin is satisfied by the candidate or by nothing; a
    // different derived version never substitutes for it.
    let mut target = match spec.pinned_version() {
        None => candidate,
        Some(pin) => match candidate.as_deref() {
            Some(cand) if cand == pin => Some(pin.to_string()),
            Some(_) => {
                reason = NoOpReason::PinNotSatisfiable;
                None
            }
            None => None,
        },
    };

    // Downgrade gate again, now against the final target: the pin itself
    // can sit below the installed version.
    if let (Some(_), Some(t)) = (current_version, target.as_deref()) {
        if compare_versions(current_version, Some(t)) == Ordering::Greater
            && !spec.allow_downgrade
        {
            target = None;
            reason = NoOpReason::DowngradeRefused;
        }
    }

    let decision = match target {
        None => Decision::NoOp { reason },
        Some(target) => match current_version {
            None => Decision::Install { version: target },
            Some(cur) if compare_versions(Some(cur), Some(target.as_str())) == Ordering::Equal => {
                Decision::NoOp {
                    reason: NoOpReason::Satisfied,
                }
            }
            Some(cur) => Decision::ChangeVersion {
                from: cur.to_string(),
                to: target,
            },
        },
    };
    Ok(decision)
}

/// Decide whether a remove request has anything left to do.
pub fn plan_remove(spec: &PackageSpec, current: Option<&PackageRecord>) -> Decision {
    match current.and_then(|record| record.version.as_ref()) {
        Some(_) => Decision::Remove {
            version: spec.pinned_version().map(str::to_string),
        },
        None => Decision::NoOp {
            reason: NoOpReason::NotInstalled,
        },
    }
}

/// Pass state after source resolution, backend selection, and the
/// current-state query. The resolved source keeps any downloaded temp
/// file alive until the pass ends.
struct Prepared {
    kind: Option<BackendKind>,
    resolved: Option<ResolvedSource>,
    current: Option<PackageRecord>,
}

fn prepare(
    spec: &PackageSpec,
    caps: &Capabilities,
    fetch: FetchOptions,
) -> Result<Prepared, ReconcileError> {
    let resolved = match spec.configured_source() {
        Some(locator) => Some(resolve_source(locator, fetch)?),
        None => None,
    };

    // An explicit kind wins; otherwise detect from the resolved source.
    let detected = match spec.backend {
        Some(kind) => Some(kind),
        None => detect_backend(resolved.as_ref().map(|r| r.path())),
    };

    let kind = match detected {
        Some(kind) => {
            if kind == BackendKind::NimClient && spec.backend.is_none() && !caps.supports(kind) {
                // The NIM fallback was only an assumption; without
                // nimclient the source type is simply undeterminable.
                return Err(ReconcileError::DetectionFailed {
                    source_spec: spec.configured_source().unwrap_or("").to_string(),
                    missing: caps.missing().iter().map(|s| (*s).to_string()).collect(),
                });
            }
            caps.require(kind, &spec.name)?;
            Some(kind)
        }
        None => None,
    };

    match kind {
        Some(kind) => {
            let current = backend_for(kind).query_current(&spec.name)?;
            Ok(Prepared {
                kind: Some(kind),
                resolved,
                current,
            })
        }
        None => {
            // No source to judge from: the package is whatever a backend
            // says it is. The first installed record wins and fixes the
            // backend for the rest of the pass.
            for kind in QUERY_PROBE_ORDER {
                if !caps.supports(kind) {
                    continue;
                }
                if let Some(record) = backend_for(kind).query_current(&spec.name)? {
                    debug!("{} found installed via {}", spec.name, kind);
                    return Ok(Prepared {
                        kind: Some(kind),
                        resolved,
                        current: Some(record),
                    });
                }
            }
            Ok(Prepared {
                kind: None,
                resolved,
                current: None,
            })
        }
    }
}

fn run_install(
    spec: &PackageSpec,
    prepared: Prepared,
    execute: bool,
) -> Result<Outcome, ReconcileError> {
    let Prepared {
        kind,
        resolved,
        current,
    } = prepared;

    let candidate = match (kind, resolved.as_ref()) {
        (Some(kind), Some(resolved)) => {
            backend_for(kind).probe_candidate(resolved.path(), &spec.name)?
        }
        _ => None,
    };
    debug!(
        "package {}: current {:?}, candidate {:?}",
        spec.name,
        current.as_ref().and_then(|r| r.version.as_deref()),
        candidate
    );

    let decision = plan(spec, current.as_ref(), candidate.as_deref())?;
    info!("{}: {}", spec.name, decision);

    let mut executed = false;
    if execute && decision.is_actionable() {
        let Some(kind) = kind else {
            // Actionable install decisions always come out of a resolved
            // source, which pins the backend.
            return Err(ReconcileError::NoCandidate {
                name: spec.name.clone(),
            });
        };
        let status = backend_for(kind).install(&InstallRequest {
            name: &spec.name,
            version: decision.target_version().unwrap_or(""),
            source: resolved.as_ref().map(|r| r.path()).unwrap_or(""),
            options: spec.options.as_deref(),
            current: current.as_ref(),
            allow_downgrade: spec.allow_downgrade,
            only_apply: spec.only_apply,
        })?;
        if status != 0 {
            return Err(ReconcileError::ToolFailure {
                backend: kind,
                operation: "install",
                name: spec.name.clone(),
                status,
            });
        }
        executed = true;
    }

    Ok(Outcome {
        name: spec.name.clone(),
        backend: kind,
        current,
        decision,
        executed,
    })
}

fn run_remove(spec: &PackageSpec, prepared: Prepared) -> Result<Outcome, ReconcileError> {
    let Prepared {
        kind,
        resolved: _resolved,
        current,
    } = prepared;

    let decision = plan_remove(spec, current.as_ref());
    info!("{}: {}", spec.name, decision);

    let mut executed = false;
    if decision.is_actionable() {
        let Some(kind) = kind else {
            return Err(ReconcileError::UnknownRemoval {
                name: spec.name.clone(),
            });
        };
        let status = backend_for(kind).remove(
            &spec.name,
            decision.target_version(),
            spec.options.as_deref(),
        )?;
        if status != 0 {
            return Err(ReconcileError::ToolFailure {
                backend: kind,
                operation: "remove",
                name: spec.name.clone(),
                status,
            });
        }
        executed = true;
    }

    Ok(Outcome {
        name: spec.name.clone(),
        backend: kind,
        current,
        decision,
        executed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordState;

    fn spec_with_source(source: &str) -> PackageSpec {
        let mut spec = PackageSpec::new("util");
        spec.source = Some(source.to_string());
        spec
    }

    fn installed(version: &str) -> PackageRecord {
        PackageRecord {
            name: "util".to_string(),
            version: Some(version.to_string()),
            state: RecordState::Committed,
            description: String::new(),
            locked: false,
            install_path: "/".to_string(),
            build_date: String::new(),
        }
    }

    #[test]
    fn test_plan_errors_without_source_or_record() {
        let spec = PackageSpec::new("util");
        let err = plan(&spec, None, None).unwrap_err();
        assert!(matches!(err, ReconcileError::NoCandidate { .. }));
    }

    #[test]
    fn test_plan_fresh_install_adopts_candidate() {
        let spec = spec_with_source("/tmp/util.rpm");
        let decision = plan(&spec, None, Some("1.0-1")).unwrap();
        assert_eq!(
            decision,
            Decision::Install {
                version: "1.0-1".to_string()
            }
        );
    }

    #[test]
    fn test_plan_satisfied_is_noop() {
        let spec = spec_with_source("/tmp/util.rpm");
        let current = installed("1.0-1");
        let decision = plan(&spec, Some(&current), Some("1.0-1")).unwrap();
        assert_eq!(
            decision,
            Decision::NoOp {
                reason: NoOpReason::Satisfied
            }
        );
    }

    #[test]
    fn test_plan_upgrade_changes_version() {
        let spec = spec_with_source("/tmp/util.rpm");
        let current = installed("1.0");
        let decision = plan(&spec, Some(&current), Some("2.0")).unwrap();
        assert_eq!(
            decision,
            Decision::ChangeVersion {
                from: "1.0".to_string(),
                to: "2.0".to_string()
            }
        );
    }

    #[test]
    fn test_plan_downgrade_gate() {
        let mut spec = spec_with_source("/tmp/util.rpm");
        let current = installed("2.0");

        let decision = plan(&spec, Some(&current), Some("1.0")).unwrap();
        assert_eq!(
            decision,
            Decision::NoOp {
                reason: NoOpReason::DowngradeRefused
            }
        );

        spec.allow_downgrade = true;
        let decision = plan(&spec, Some(&current), Some("1.0")).unwrap();
        assert_eq!(
            decision,
            Decision::ChangeVersion {
                from: "2.0".to_string(),
                to: "1.0".to_string()
            }
        );
    }

    #[test]
    fn test_plan_pin_mismatch_is_silent_noop() {
        let mut spec = spec_with_source("/tmp/util.rpm");
        spec.version = Some("3.0".to_string());
        let decision = plan(&spec, None, Some("2.5")).unwrap();
        assert_eq!(
            decision,
            Decision::NoOp {
                reason: NoOpReason::PinNotSatisfiable
            }
        );
    }

    #[test]
    fn test_plan_pin_match_installs() {
        let mut spec = spec_with_source("/tmp/util.rpm");
        spec.version = Some("2.5".to_string());
        let decision = plan(&spec, None, Some("2.5")).unwrap();
        assert_eq!(
            decision,
            Decision::Install {
                version: "2.5".to_string()
            }
        );
    }

    #[test]
    fn test_plan_pinned_downgrade_still_gated() {
        let mut spec = spec_with_source("/tmp/util.rpm");
        spec.version = Some("1.0".to_string());
        let current = installed("2.0");

        let decision = plan(&spec, Some(&current), Some("1.0")).unwrap();
        assert_eq!(
            decision,
            Decision::NoOp {
                reason: NoOpReason::DowngradeRefused
            }
        );

        spec.allow_downgrade = true;
        let decision = plan(&spec, Some(&current), Some("1.0")).unwrap();
        assert_eq!(
            decision,
            Decision::ChangeVersion {
                from: "2.0".to_string(),
                to: "1.0".to_string()
            }
        );
    }

    #[test]
    fn test_plan_no_probe_result_is_noop_for_installed() {
        // Installed, source configured, but the probe derived nothing.
        let spec = spec_with_source("/tmp/util.rpm");
        let current = installed("1.0");
        let decision = plan(&spec, Some(&current), None).unwrap();
        assert_eq!(
            decision,
            Decision::NoOp {
                reason: NoOpReason::NoCandidate
            }
        );
    }

    #[test]
    fn test_plan_installed_without_source_is_noop() {
        let spec = PackageSpec::new("util");
        let current = installed("1.0");
        let decision = plan(&spec, Some(&current), None).unwrap();
        assert_eq!(
            decision,
            Decision::NoOp {
                reason: NoOpReason::NoCandidate
            }
        );
    }

    #[test]
    fn test_plan_remove() {
        let spec = PackageSpec::new("util");
        let current = installed("1.0");
        assert_eq!(
            plan_remove(&spec, Some(&current)),
            Decision::Remove { version: None }
        );
        assert_eq!(
            plan_remove(&spec, None),
            Decision::NoOp {
                reason: NoOpReason::NotInstalled
            }
        );

        let mut pinned = PackageSpec::new("util");
        pinned.version = Some("1.0".to_string());
        assert_eq!(
            plan_remove(&pinned, Some(&current)),
            Decision::Remove {
                version: Some("1.0".to_string())
            }
        );
    }
}
