//! Stevedore CLI - a declarative package-state reconciler for AIX

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use stevedore::{Action, FetchOptions};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stevedore=debug")
    } else {
        EnvFilter::new("stevedore=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let fetch = FetchOptions {
        verify_tls: cli.verify_tls,
    };

    // Execute command
    match cli.command {
        Commands::Install(args) => commands::package::execute(args, Action::Install, fetch),
        Commands::Upgrade(args) => commands::package::execute(args, Action::Upgrade, fetch),
        Commands::Remove(args) => commands::package::execute_remove(args, Action::Remove, fetch),
        Commands::Purge(args) => commands::package::execute_remove(args, Action::Purge, fetch),
        Commands::Check(args) => commands::package::execute_check(args, fetch),
        Commands::Apply(args) => commands::apply::execute(args, fetch),
        Commands::Doctor => commands::doctor::execute(),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
