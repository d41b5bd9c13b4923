//! Core domain types: references, versions, ids and relationships.

mod builder;
mod ids;
mod refs;
mod relationship;
mod version;

pub use builder::RelationshipSetBuilder;
pub use ids::{NodeId, RelationshipId, ViewId};
pub use refs::{ArtifactRef, DEFAULT_TYPE, ProjectRef, ProjectVersionRef};
pub use relationship::{
    BomRelationship, DependencyRelationship, DependencyScope, ExtensionRelationship,
    ParentRelationship, PluginDependencyRelationship, PluginRelationship, ProjectRelationship,
    RelationshipCommon, RelationshipKind, canonical_order,
};
pub use version::{RangeBound, SingleVersion, VersionRange, VersionSpec};

impl ProjectVersionRef {
    /// The node id of this project version.
    pub fn node_id(&self) -> NodeId {
        NodeId::for_key(&self.to_string())
    }
}
