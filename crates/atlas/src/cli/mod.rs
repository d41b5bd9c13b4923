//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize an atlas workspace
//! - `add`: Insert relationships from a JSONL file
//! - `traverse`: List the relationships a view follows
//! - `cycles`: Show the cycles reachable in a view
//! - `paths`: Show the paths from a view's roots to a project
//! - `check-cycle`: Ask whether a relationship would close a cycle
//! - `build-order`: Order a view's projects dependencies-first
//! - `ancestry`: Show a project's parent chain
//! - `resolve`: List a view's transitive dependency artifacts
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! atlas init --workspace build
//! atlas add relationships.jsonl
//! atlas cycles --root org.acme:app:1.0 --filter runtime
//! atlas paths --root org.acme:app:1.0 --target org.acme:util:2.1 --managed
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    AddArgs, AncestryArgs, BuildOrderArgs, CheckCycleArgs, CyclesArgs, InitArgs, PathsArgs,
    ResolveArgs, TraverseArgs, ViewArgs,
};
pub use types::{FilterArg, KindArg, OrderArg};
pub use validators::{validate_gav, validate_workspace};

/// Atlas - Maven project relationship graphs
///
/// Store parent, BOM, dependency, plugin and extension relationships between
/// project versions, then query them through views: cycles, paths, build
/// order and transitive dependencies.
#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new atlas workspace
    ///
    /// Creates the `.atlas/` directory with configuration and an empty
    /// relationship file.
    Init(InitArgs),

    /// Add relationships from a JSONL file
    ///
    /// Each line is one relationship object. Relationships already stored
    /// are skipped.
    Add(AddArgs),

    /// List the relationships a view follows
    Traverse(TraverseArgs),

    /// Show cycles reachable from the view's roots
    Cycles(CyclesArgs),

    /// Show every known path from the view's roots to a project
    Paths(PathsArgs),

    /// Check whether adding a relationship would close a cycle
    ///
    /// Looks at every stored relationship, regardless of view.
    CheckCycle(CheckCycleArgs),

    /// Order the view's projects so dependencies come first
    BuildOrder(BuildOrderArgs),

    /// Show the parent chain of a project
    Ancestry(AncestryArgs),

    /// List transitive dependency artifacts, nearest version first
    Resolve(ResolveArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args),
            Some(Commands::Add(args)) => execute::execute_add(&load_app()?, args, output_mode),
            Some(Commands::Traverse(args)) => {
                execute::execute_traverse(&load_app()?, args, output_mode)
            }
            Some(Commands::Cycles(args)) => execute::execute_cycles(&load_app()?, args, output_mode),
            Some(Commands::Paths(args)) => execute::execute_paths(&load_app()?, args, output_mode),
            Some(Commands::CheckCycle(args)) => {
                execute::execute_check_cycle(&load_app()?, args, output_mode)
            }
            Some(Commands::BuildOrder(args)) => {
                execute::execute_build_order(&load_app()?, args, output_mode)
            }
            Some(Commands::Ancestry(args)) => {
                execute::execute_ancestry(&load_app()?, args, output_mode)
            }
            Some(Commands::Resolve(args)) => execute::execute_resolve(&load_app()?, args, output_mode),
            None => {
                println!("Atlas project relationship graph");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

/// Load the workspace containing the current directory.
fn load_app() -> Result<crate::app::App> {
    Ok(crate::app::App::from_directory(&std::env::current_dir()?)?)
}
