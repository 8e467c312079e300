//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// Embark - an Emscripten SDK build orchestrator for Make, Autotools,
/// and CMake projects
#[derive(Parser)]
#[command(name = "embark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Skip checking the Emscripten SDK server for updates
    #[arg(long, global = true)]
    pub no_update: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure the project
    Configure(LocatorArgs),

    /// Build the project, configuring it first if necessary
    Build(LocatorArgs),

    /// Reset the project's build directories
    Clean(LocatorArgs),

    /// Install the project's build files per the install target
    Install(LocatorArgs),

    /// Clean the project, then configure it
    Reconfigure(LocatorArgs),

    /// Clean the project, configure it, then build
    Rebuild(LocatorArgs),

    /// Build the project; if the build fails, clean then rebuild
    Compile(LocatorArgs),

    /// Install the configured Emscripten SDK version without building
    InstallSdk(LocatorArgs),

    /// Run an arbitrary command within the SDK environment
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// A config locator: the path to a settings or build file, a directory
/// containing one, or the name of a settings object in embark.toml.
/// Defaults to the current directory.
#[derive(Args)]
pub struct LocatorArgs {
    pub locator: Option<String>,
}

#[derive(Args)]
pub struct RunArgs {
    /// The command to run
    pub command: String,

    /// Arguments passed through untouched
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
