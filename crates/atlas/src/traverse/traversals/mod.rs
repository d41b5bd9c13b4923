//! Ready-made traversals.

mod ancestry;
mod build_order;
mod filtering;
mod transitive;

pub use ancestry::AncestryTraversal;
pub use build_order::BuildOrderTraversal;
pub use filtering::FilteringTraversal;
pub use transitive::TransitiveDependencyTraversal;
