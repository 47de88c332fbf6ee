//! Stevedore - a declarative package-state reconciler for AIX
//!
//! This crate takes a desired package specification (name, version,
//! source, options), determines the package's current installed state
//! through one of four packaging subsystems (rpm, emgr interim fixes,
//! installp filesets, NIM lpp_sources), computes the minimal action that
//! converges actual state to desired state, and executes it through the
//! matching backend.

pub mod backend;
pub mod core;
pub mod reconcile;
pub mod sources;
pub mod util;

pub use backend::{detect_backend, Backend, BackendKind, Capabilities};
pub use core::{Decision, Manifest, NoOpReason, PackageRecord, PackageSpec, RecordState};
pub use reconcile::errors::ReconcileError;
pub use reconcile::{check, plan, reconcile, Action, Outcome};
pub use sources::{resolve_source, FetchOptions, ResolvedSource};
