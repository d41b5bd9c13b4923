//! Storage abstraction for the relationship graph.
//!
//! The traversal engine never touches a concrete store. Everything it needs
//! goes through [`GraphStorage`]: resolve a relationship id, list a node's
//! edges, look up projects, and read or write named property blobs (used for
//! persisted path caches).
//!
//! # Edge direction
//!
//! Edges point from the **declaring** project to the **target** project, the
//! same direction the relationship reads: `app -> lib` means `app` declares a
//! relationship on `lib`.
//!
//! # Implementations
//!
//! - [`in_memory::InMemoryStorage`]: petgraph-backed, optionally persisted as
//!   JSONL. Used by the CLI and the tests.

pub mod in_memory;

use crate::domain::{NodeId, ProjectRef, ProjectRelationship, ProjectVersionRef, RelationshipId};
use crate::error::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Read/write access to a relationship graph.
///
/// Implementations must be safe to share between concurrent traversals:
/// reads happen from many threads, writes are serialized by the
/// implementation.
pub trait GraphStorage: Send + Sync {
    /// Insert relationships, creating nodes for unseen projects.
    ///
    /// Insertion is idempotent under structural equality: a relationship
    /// equal to one already stored is skipped. Returns the ids of the
    /// relationships that were actually new, in input order.
    fn add_relationships(&self, relationships: &[ProjectRelationship])
    -> Result<Vec<RelationshipId>>;

    /// Resolve a relationship id.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` for unknown ids.
    fn relationship(&self, id: RelationshipId) -> Result<Arc<ProjectRelationship>>;

    /// Relationships declared by `node`, in canonical order.
    fn outgoing(&self, node: NodeId) -> Result<Vec<Arc<ProjectRelationship>>>;

    /// Relationships targeting `node`, in canonical order.
    fn incoming(&self, node: NodeId) -> Result<Vec<Arc<ProjectRelationship>>>;

    /// The project stored under `node`, if any.
    fn project(&self, node: NodeId) -> Option<ProjectVersionRef>;

    /// Every stored project, sorted.
    fn projects(&self) -> Vec<ProjectVersionRef>;

    /// Stored nodes for the given project, across all its versions.
    fn find_versions(&self, project: &ProjectRef) -> Vec<ProjectVersionRef> {
        self.projects()
            .into_iter()
            .filter(|p| p.project() == project)
            .collect()
    }

    /// Number of stored relationships.
    fn relationship_count(&self) -> usize;

    /// Whether inserting `relationship` would close a cycle, without
    /// inserting it.
    ///
    /// The default walks outgoing edges from the target looking for the
    /// declaring node. Self-referential relationships are not cycles.
    fn introduces_cycle(&self, relationship: &ProjectRelationship) -> Result<bool> {
        if relationship.is_self_referential() {
            return Ok(false);
        }
        let goal = relationship.declaring().node_id();
        let mut stack = vec![relationship.target().node_id()];
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == goal {
                return Ok(true);
            }
            if !visited.insert(node) {
                continue;
            }
            for rel in self.outgoing(node)? {
                stack.push(rel.target().node_id());
            }
        }
        Ok(false)
    }

    /// Read a named property blob.
    fn property(&self, key: &str) -> Option<String>;

    /// Write a named property blob, replacing any previous value.
    fn set_property(&self, key: &str, value: String) -> Result<()>;

    /// Remove a named property blob. Returns whether it existed.
    fn remove_property(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryStorage;
    use super::*;
    use crate::domain::{ArtifactRef, DependencyScope};

    fn dep(from: &str, to: &str) -> ProjectRelationship {
        ProjectRelationship::dependency(
            from.parse().unwrap(),
            ArtifactRef::jar(to.parse().unwrap()),
            DependencyScope::Compile,
            0,
            false,
        )
    }

    /// Storage that forwards everything but `introduces_cycle`, so the
    /// trait's default reachability walk gets exercised.
    struct DefaultCycleCheck(InMemoryStorage);

    impl GraphStorage for DefaultCycleCheck {
        fn add_relationships(&self, rels: &[ProjectRelationship]) -> Result<Vec<RelationshipId>> {
            self.0.add_relationships(rels)
        }
        fn relationship(&self, id: RelationshipId) -> Result<Arc<ProjectRelationship>> {
            self.0.relationship(id)
        }
        fn outgoing(&self, node: NodeId) -> Result<Vec<Arc<ProjectRelationship>>> {
            self.0.outgoing(node)
        }
        fn incoming(&self, node: NodeId) -> Result<Vec<Arc<ProjectRelationship>>> {
            self.0.incoming(node)
        }
        fn project(&self, node: NodeId) -> Option<ProjectVersionRef> {
            self.0.project(node)
        }
        fn projects(&self) -> Vec<ProjectVersionRef> {
            self.0.projects()
        }
        fn relationship_count(&self) -> usize {
            self.0.relationship_count()
        }
        fn property(&self, key: &str) -> Option<String> {
            self.0.property(key)
        }
        fn set_property(&self, key: &str, value: String) -> Result<()> {
            self.0.set_property(key, value)
        }
        fn remove_property(&self, key: &str) -> Result<bool> {
            self.0.remove_property(key)
        }
    }

    #[test]
    fn test_default_introduces_cycle_matches_petgraph() {
        let storage = DefaultCycleCheck(InMemoryStorage::new());
        storage
            .add_relationships(&[dep("g:p:1", "g:d:1"), dep("g:d:1", "g:d2:1")])
            .unwrap();

        let closing = dep("g:d2:1", "g:p:1");
        let harmless = dep("g:p:1", "g:d2:1");
        assert!(storage.introduces_cycle(&closing).unwrap());
        assert!(!storage.introduces_cycle(&harmless).unwrap());
        assert_eq!(
            storage.introduces_cycle(&closing).unwrap(),
            storage.0.introduces_cycle(&closing).unwrap()
        );
        assert_eq!(storage.relationship_count(), 2);
    }

    #[test]
    fn test_find_versions_filters_by_project() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[dep("g:p:1", "g:d:1"), dep("g:p:1", "g:d:2")])
            .unwrap();
        let versions = storage.find_versions(&"g:d".parse().unwrap());
        assert_eq!(versions.len(), 2);
    }
}
