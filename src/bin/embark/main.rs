//! Embark CLI - drive native C/C++ builds inside the Emscripten SDK

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use embark::sdk::UpdatePolicy;
use embark::util::{Shell, Verbosity};

mod cli;
mod commands;

use cli::{Cli, Commands};

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
        EnvFilter::new("embark=debug")
    } else {
        EnvFilter::new("embark=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let opts = commands::GlobalOpts {
        update_policy: if cli.no_update {
            UpdatePolicy::Never
        } else {
            UpdatePolicy::Auto
        },
        shell: Shell::new(verbosity),
    };

    // Execute command
    match cli.command {
        Commands::Configure(args) => commands::configure::execute(args, &opts),
        Commands::Build(args) => commands::build::execute(args, &opts),
        Commands::Clean(args) => commands::clean::execute(args, &opts),
        Commands::Install(args) => commands::install::execute(args, &opts),
        Commands::Reconfigure(args) => commands::reconfigure::execute(args, &opts),
        Commands::Rebuild(args) => commands::rebuild::execute(args, &opts),
        Commands::Compile(args) => commands::compile::execute(args, &opts),
        Commands::InstallSdk(args) => commands::sdk::execute(args, &opts),
        Commands::Run(args) => commands::run::execute(args, &opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
