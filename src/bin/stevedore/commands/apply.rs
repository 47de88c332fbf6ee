//! `stevedore apply` command
//!
//! Reconciles every package a manifest declares, independently and in file
//! order. One failing entry does not stop the rest; the command exits
//! non-zero if any entry failed.

use anyhow::{bail, Result};

use crate::cli::ApplyArgs;
use stevedore::{reconcile, Capabilities, FetchOptions, Manifest};

pub fn execute(args: ApplyArgs, fetch: FetchOptions) -> Result<()> {
    let manifest = Manifest::load(&args.file)?;
    if manifest.packages.is_empty() {
        println!("manifest declares no packages");
        return Ok(());
    }

    let caps = Capabilities::probe();
    let total = manifest.packages.len();
    let mut failures = 0usize;

    for entry in &manifest.packages {
        match reconcile(&entry.spec(), entry.action, &caps, fetch) {
            Ok(outcome) => match outcome.backend {
                Some(backend) => println!("{} [{}]: {}", outcome.name, backend, outcome.decision),
                None => println!("{}: {}", outcome.name, outcome.decision),
            },
            Err(err) => {
                let err = anyhow::Error::new(err);
                eprintln!("error: {}: {:#}", entry.name, err);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {total} package(s) failed to reconcile");
    }
    println!("{total} package(s) reconciled");
    Ok(())
}
