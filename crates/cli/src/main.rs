//! featgate CLI - Inspect feature definitions and evaluate access
//!
//! Usage:
//!   featgate roles                           - List roles and resolved permissions
//!   featgate check --role <role>             - Show what a role can reach
//!   featgate access <feature> --role <role>  - Evaluate an actor's access
//!   featgate manifest [-o file]              - Export the feature manifest

use clap::{Parser, Subcommand};
use cli::commands::{AccessCommand, CheckCommand, ManifestCommand, RolesCommand};

#[derive(Parser)]
#[command(name = "featgate")]
#[command(about = "featgate - Feature-scoped role based access control")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every role with its resolved permissions
    Roles(RolesCommand),
    /// Check permissions for a role
    Check(CheckCommand),
    /// Evaluate an actor's access to a feature
    Access(AccessCommand),
    /// Export the feature manifest
    Manifest(ManifestCommand),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Roles(cmd) => cmd.run(),
        Commands::Check(cmd) => cmd.run(),
        Commands::Access(cmd) => cmd.run(),
        Commands::Manifest(cmd) => cmd.run(),
    }
}
