//! Core data structures for Stevedore.
//!
//! This module contains the types a reconciliation pass is built from:
//! the desired-state spec, the observed installed record, the derived
//! decision, and the declarative manifest that feeds specs in bulk.

pub mod decision;
pub mod manifest;
pub mod record;
pub mod spec;

pub use decision::{Decision, NoOpReason};
pub use manifest::{Manifest, PackageEntry};
pub use record::{PackageRecord, RecordState};
pub use spec::PackageSpec;
