//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use stevedore::BackendKind;

/// Stevedore - a declarative package-state reconciler for AIX
#[derive(Parser)]
#[command(name = "stevedore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Verify TLS certificates when fetching https sources
    #[arg(long, global = true)]
    pub verify_tls: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Converge a package to its desired state
    Install(PackageArgs),

    /// Converge a package to the newest candidate from its source
    Upgrade(PackageArgs),

    /// Remove an installed package
    Remove(RemoveArgs),

    /// Remove an installed package (these backends keep nothing to purge)
    Purge(RemoveArgs),

    /// Decide what install would do, without doing it
    Check(CheckArgs),

    /// Reconcile every package declared in a manifest
    Apply(ApplyArgs),

    /// Report which backend tools are available on this system
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct PackageArgs {
    /// Package, fileset, or efix name
    pub name: String,

    /// Local path, http(s)/ftp locator, or NIM resource name
    #[arg(short, long)]
    pub source: Option<String>,

    /// Exact version pin
    #[arg(long)]
    pub version: Option<String>,

    /// Backend (rpm, emgr, installp, nimclient); detected when omitted
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Extra flags passed through to the backend tool
    #[arg(long)]
    pub options: Option<String>,

    /// Permit replacing the installed version with an older one
    #[arg(long)]
    pub allow_downgrade: bool,

    /// installp/nimclient: apply without committing
    #[arg(long)]
    pub only_apply: bool,
}

#[derive(Args)]
pub struct RemoveArgs {
    /// Package, fileset, or efix name
    pub name: String,

    /// Remove this version only
    #[arg(long)]
    pub version: Option<String>,

    /// Backend (rpm, emgr, installp, nimclient); detected when omitted
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Extra flags passed through to the backend tool
    #[arg(long)]
    pub options: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub package: PackageArgs,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Manifest file with [[package]] entries
    pub file: PathBuf,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
