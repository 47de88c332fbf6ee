//! `stevedore install`, `upgrade`, `remove`, `purge`, and `check` commands

use anyhow::Result;

use crate::cli::{CheckArgs, PackageArgs, RemoveArgs};
use stevedore::{check, reconcile, Action, Capabilities, FetchOptions, Outcome, PackageSpec};

pub fn execute(args: PackageArgs, action: Action, fetch: FetchOptions) -> Result<()> {
    let spec = spec_from(args);
    let caps = Capabilities::probe();

    let outcome = reconcile(&spec, action, &caps, fetch)?;
    report(&outcome);
    Ok(())
}

pub fn execute_remove(args: RemoveArgs, action: Action, fetch: FetchOptions) -> Result<()> {
    let mut spec = PackageSpec::new(args.name);
    spec.version = args.version;
    spec.backend = args.backend;
    spec.options = args.options;
    let caps = Capabilities::probe();

    let outcome = reconcile(&spec, action, &caps, fetch)?;
    report(&outcome);
    Ok(())
}

pub fn execute_check(args: CheckArgs, fetch: FetchOptions) -> Result<()> {
    let spec = spec_from(args.package);
    let caps = Capabilities::probe();

    let outcome = check(&spec, &caps, fetch)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        report(&outcome);
    }
    Ok(())
}

fn spec_from(args: PackageArgs) -> PackageSpec {
    let mut spec = PackageSpec::new(args.name);
    spec.version = args.version;
    spec.source = args.source;
    spec.backend = args.backend;
    spec.options = args.options;
    spec.allow_downgrade = args.allow_downgrade;
    spec.only_apply = args.only_apply;
    spec
}

fn report(outcome: &Outcome) {
    match outcome.backend {
        Some(backend) => println!("{} [{}]: {}", outcome.name, backend, outcome.decision),
        None => println!("{}: {}", outcome.name, outcome.decision),
    }
}
