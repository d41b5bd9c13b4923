//! Graph-level model: paths, views, filters and mutators.

pub mod filter;
pub mod mutator;
mod path;
mod path_info;
mod view;

pub use filter::{
    AndFilter, AnyFilter, DependencyFilter, ExcludingFilter, KindFilter, NoneFilter, OrFilter,
    ProjectRelationshipFilter,
};
pub use mutator::{GraphMutator, ManagedDependencyMutator, NoOpGraphMutator, Selections};
pub use path::{CyclePath, GraphPath, terminating_cycle};
pub use path_info::{GraphPathInfo, PathEntry};
pub use view::GraphView;
