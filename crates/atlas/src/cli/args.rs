//! CLI argument structs for all commands.

use clap::{Args, Parser};
use std::path::PathBuf;
use std::sync::Arc;

use super::types::{FilterArg, KindArg, OrderArg};
use super::validators::{validate_gav, validate_workspace};
use crate::domain::ProjectVersionRef;
use crate::graph::{GraphView, ManagedDependencyMutator};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Workspace label attached to every view
    ///
    /// Letters, digits, '-', '_' and '.', at most 64 characters.
    #[arg(short, long, value_parser = validate_workspace)]
    pub workspace: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// View selection shared by every graph query
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Root project, as groupId:artifactId:version (repeatable)
    #[arg(short, long = "root", value_parser = validate_gav, required = true)]
    pub roots: Vec<ProjectVersionRef>,

    /// Relationships the view follows
    #[arg(short, long, value_enum, default_value_t = FilterArg::Any)]
    pub filter: FilterArg,

    /// Apply managed dependency versions declared along each path
    #[arg(short, long)]
    pub managed: bool,

    /// Pin a project to a version, as groupId:artifactId:version (repeatable)
    #[arg(long = "pin", value_parser = validate_gav)]
    pub pins: Vec<ProjectVersionRef>,
}

impl ViewArgs {
    /// Build the view these arguments describe in `workspace`.
    pub fn to_view(&self, workspace: &str) -> GraphView {
        let mut view = GraphView::new(workspace, self.roots.iter().cloned());
        if let Some(filter) = self.filter.to_filter() {
            view = view.with_filter(filter);
        }
        if self.managed {
            view = view.with_mutator(Arc::new(ManagedDependencyMutator::new()));
        }
        for pin in &self.pins {
            view = view.with_selection(pin.clone());
        }
        view
    }
}

/// Arguments for the `add` command
#[derive(Parser, Debug, Clone)]
pub struct AddArgs {
    /// JSONL file with one relationship per line
    pub file: PathBuf,
}

/// Arguments for the `traverse` command
#[derive(Parser, Debug, Clone)]
pub struct TraverseArgs {
    /// View selection
    #[command(flatten)]
    pub view: ViewArgs,

    /// Edge order (defaults to the configured order)
    #[arg(short, long, value_enum)]
    pub order: Option<OrderArg>,
}

/// Arguments for the `cycles` command
#[derive(Parser, Debug, Clone)]
pub struct CyclesArgs {
    /// View selection
    #[command(flatten)]
    pub view: ViewArgs,
}

/// Arguments for the `paths` command
#[derive(Parser, Debug, Clone)]
pub struct PathsArgs {
    /// View selection
    #[command(flatten)]
    pub view: ViewArgs,

    /// Project the paths lead to
    #[arg(short, long, value_parser = validate_gav)]
    pub target: ProjectVersionRef,
}

/// Arguments for the `check-cycle` command
#[derive(Parser, Debug, Clone)]
pub struct CheckCycleArgs {
    /// Declaring project of the candidate relationship
    #[arg(value_parser = validate_gav)]
    pub declaring: ProjectVersionRef,

    /// Target project of the candidate relationship
    #[arg(value_parser = validate_gav)]
    pub target: ProjectVersionRef,

    /// Kind of the candidate relationship
    #[arg(short, long, value_enum, default_value = "dependency")]
    pub kind: KindArg,
}

/// Arguments for the `build-order` command
#[derive(Parser, Debug, Clone)]
pub struct BuildOrderArgs {
    /// View selection
    #[command(flatten)]
    pub view: ViewArgs,
}

/// Arguments for the `ancestry` command
#[derive(Parser, Debug, Clone)]
pub struct AncestryArgs {
    /// Project whose parent chain to show
    #[arg(value_parser = validate_gav)]
    pub project: ProjectVersionRef,
}

/// Arguments for the `resolve` command
#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// View selection
    #[command(flatten)]
    pub view: ViewArgs,
}
