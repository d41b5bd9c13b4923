//! CLI value enums and their conversions to graph types.

use clap::ValueEnum;
use std::sync::Arc;

use crate::domain::{ArtifactRef, DependencyScope, ProjectRelationship, ProjectVersionRef, RelationshipKind};
use crate::graph::{DependencyFilter, KindFilter, ProjectRelationshipFilter};
use crate::traverse::TraversalType;

/// Which relationships a view follows
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterArg {
    /// Every relationship
    #[default]
    Any,
    /// Dependencies of any classpath scope
    Deps,
    /// Compile-classpath dependencies
    Compile,
    /// Runtime-classpath dependencies
    Runtime,
    /// Parent POMs only
    Parents,
    /// Parents, BOMs, plugins and extensions
    Build,
}

impl FilterArg {
    /// The filter to install on the view, if any.
    pub fn to_filter(self) -> Option<Arc<dyn ProjectRelationshipFilter>> {
        match self {
            Self::Any => None,
            Self::Deps => Some(Arc::new(DependencyFilter::new(DependencyScope::Test))),
            Self::Compile => Some(Arc::new(DependencyFilter::new(DependencyScope::Compile))),
            Self::Runtime => Some(Arc::new(DependencyFilter::new(DependencyScope::Runtime))),
            Self::Parents => Some(Arc::new(KindFilter::parents())),
            Self::Build => Some(Arc::new(KindFilter::build_only())),
        }
    }
}

impl std::fmt::Display for FilterArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Deps => write!(f, "deps"),
            Self::Compile => write!(f, "compile"),
            Self::Runtime => write!(f, "runtime"),
            Self::Parents => write!(f, "parents"),
            Self::Build => write!(f, "build"),
        }
    }
}

/// Relationship kind for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    /// Parent POM
    Parent,
    /// BOM import
    Bom,
    /// Dependency
    Dependency,
    /// Build plugin
    Plugin,
    /// Build extension
    Extension,
}

impl KindArg {
    /// A relationship of this kind from `declaring` to `target`, with
    /// default index, scope and flags.
    pub fn candidate(self, declaring: ProjectVersionRef, target: ProjectVersionRef) -> ProjectRelationship {
        match self {
            Self::Parent => ProjectRelationship::parent(declaring, target),
            Self::Bom => ProjectRelationship::bom(declaring, target, 0),
            Self::Dependency => ProjectRelationship::dependency(
                declaring,
                ArtifactRef::jar(target),
                DependencyScope::Compile,
                0,
                false,
            ),
            Self::Plugin => ProjectRelationship::plugin(declaring, target, 0, false, false),
            Self::Extension => ProjectRelationship::extension(declaring, target, 0),
        }
    }
}

impl From<KindArg> for RelationshipKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Parent => RelationshipKind::Parent,
            KindArg::Bom => RelationshipKind::Bom,
            KindArg::Dependency => RelationshipKind::Dependency,
            KindArg::Plugin => RelationshipKind::Plugin,
            KindArg::Extension => RelationshipKind::Extension,
        }
    }
}

impl std::fmt::Display for KindArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        RelationshipKind::from(*self).fmt(f)
    }
}

/// Edge order for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    /// Depth-first
    #[value(name = "depth-first", alias = "dfs")]
    DepthFirst,
    /// Breadth-first
    #[value(name = "breadth-first", alias = "bfs")]
    BreadthFirst,
}

impl From<OrderArg> for TraversalType {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::DepthFirst => TraversalType::DepthFirst,
            OrderArg::BreadthFirst => TraversalType::BreadthFirst,
        }
    }
}
