//! `stevedore doctor` command
//!
//! Reports which backend tool binaries exist on this system. The same
//! probe gates reconciliation, so a missing entry here means the matching
//! backend will fail fast.

use anyhow::Result;

use stevedore::Capabilities;

pub fn execute() -> Result<()> {
    let caps = Capabilities::probe();

    for (tool, present) in caps.report() {
        let status = if present { "present" } else { "missing" };
        println!("{tool:<22} {status}");
    }

    if caps.missing().is_empty() {
        println!("\nall backend tools are available");
    } else {
        println!(
            "\n{} tool(s) missing; the backends that need them will fail fast",
            caps.missing().len()
        );
    }
    Ok(())
}
