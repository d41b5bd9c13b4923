//! `GraphStorage` trait implementation for in-memory storage.

use super::InMemoryStorage;
use super::graph::{edges_impl, introduces_cycle_impl};
use crate::domain::{NodeId, ProjectRelationship, ProjectVersionRef, RelationshipId};
use crate::error::{Error, Result};
use crate::storage::GraphStorage;
use petgraph::Direction;
use std::sync::Arc;
use tracing::debug;

impl GraphStorage for InMemoryStorage {
    fn add_relationships(
        &self,
        relationships: &[ProjectRelationship],
    ) -> Result<Vec<RelationshipId>> {
        // Validate everything before touching the graph
        for rel in relationships {
            rel.validate()?;
        }

        let mut inner = self.inner.write();
        let added: Vec<RelationshipId> = relationships
            .iter()
            .filter_map(|rel| inner.insert(rel))
            .collect();
        debug!(
            offered = relationships.len(),
            added = added.len(),
            "Stored relationships"
        );
        Ok(added)
    }

    fn relationship(&self, id: RelationshipId) -> Result<Arc<ProjectRelationship>> {
        self.inner
            .read()
            .relationships
            .get(&id)
            .cloned()
            .ok_or(Error::RelationshipNotFound(id))
    }

    fn outgoing(&self, node: NodeId) -> Result<Vec<Arc<ProjectRelationship>>> {
        let inner = self.inner.read();
        Ok(edges_impl(
            &inner.graph,
            &inner.node_map,
            &inner.relationships,
            node,
            Direction::Outgoing,
        ))
    }

    fn incoming(&self, node: NodeId) -> Result<Vec<Arc<ProjectRelationship>>> {
        let inner = self.inner.read();
        Ok(edges_impl(
            &inner.graph,
            &inner.node_map,
            &inner.relationships,
            node,
            Direction::Incoming,
        ))
    }

    fn project(&self, node: NodeId) -> Option<ProjectVersionRef> {
        let inner = self.inner.read();
        inner
            .node_map
            .get(&node)
            .and_then(|&index| inner.graph.node_weight(index))
            .cloned()
    }

    fn projects(&self) -> Vec<ProjectVersionRef> {
        let inner = self.inner.read();
        let mut projects: Vec<ProjectVersionRef> = inner
            .graph
            .node_indices()
            .filter_map(|index| inner.graph.node_weight(index))
            .cloned()
            .collect();
        projects.sort();
        projects
    }

    fn relationship_count(&self) -> usize {
        self.inner.read().relationships.len()
    }

    fn introduces_cycle(&self, relationship: &ProjectRelationship) -> Result<bool> {
        let inner = self.inner.read();
        Ok(introduces_cycle_impl(
            &inner.graph,
            &inner.node_map,
            relationship,
        ))
    }

    fn property(&self, key: &str) -> Option<String> {
        self.inner.read().properties.get(key).cloned()
    }

    fn set_property(&self, key: &str, value: String) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::Storage("property key must not be empty".to_string()));
        }
        self.inner.write().properties.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_property(&self, key: &str) -> Result<bool> {
        Ok(self.inner.write().properties.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactRef, DependencyScope, RelationshipKind};

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    fn dep(from: &str, to: &str, index: u32) -> ProjectRelationship {
        ProjectRelationship::dependency(
            pvr(from),
            ArtifactRef::jar(pvr(to)),
            DependencyScope::Compile,
            index,
            false,
        )
    }

    #[test]
    fn test_add_is_idempotent_by_structure() {
        let storage = InMemoryStorage::new();
        let first = storage.add_relationships(&[dep("g:a:1", "g:b:1", 0)]).unwrap();
        assert_eq!(first.len(), 1);

        // Same identity, different index: not new
        let second = storage.add_relationships(&[dep("g:a:1", "g:b:1", 4)]).unwrap();
        assert!(second.is_empty());
        assert_eq!(storage.relationship_count(), 1);
        assert_eq!(storage.node_count(), 2);
    }

    #[test]
    fn test_outgoing_is_canonically_ordered() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[
                ProjectRelationship::plugin(pvr("g:a:1"), pvr("g:plug:1"), 0, false, false),
                dep("g:a:1", "g:z:1", 1),
                dep("g:a:1", "g:y:1", 0),
                ProjectRelationship::parent(pvr("g:a:1"), pvr("g:p:1")),
            ])
            .unwrap();

        let out = storage.outgoing(pvr("g:a:1").node_id()).unwrap();
        let summary: Vec<(RelationshipKind, String)> = out
            .iter()
            .map(|r| (r.kind(), r.target().artifact_id().to_string()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (RelationshipKind::Parent, "p".to_string()),
                (RelationshipKind::Dependency, "y".to_string()),
                (RelationshipKind::Dependency, "z".to_string()),
                (RelationshipKind::Plugin, "plug".to_string()),
            ]
        );

        let incoming = storage.incoming(pvr("g:y:1").node_id()).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].declaring(), &pvr("g:a:1"));
    }

    #[test]
    fn test_unknown_relationship_is_an_error() {
        let storage = InMemoryStorage::new();
        let id = dep("g:a:1", "g:b:1", 0).id();
        assert!(matches!(
            storage.relationship(id),
            Err(Error::RelationshipNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn test_introduces_cycle_does_not_insert() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[dep("g:p:1", "g:d:1", 0), dep("g:d:1", "g:d2:1", 0)])
            .unwrap();

        let closing = dep("g:d2:1", "g:p:1", 0);
        assert!(storage.introduces_cycle(&closing).unwrap());
        assert_eq!(storage.relationship_count(), 2);
        assert!(
            !storage
                .introduces_cycle(&ProjectRelationship::terminal_parent(pvr("g:p:1")))
                .unwrap()
        );
        assert!(!storage.introduces_cycle(&dep("g:new:1", "g:p:1", 0)).unwrap());
    }

    #[test]
    fn test_properties() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.property("k"), None);
        storage.set_property("k", "v1".to_string()).unwrap();
        storage.set_property("k", "v2".to_string()).unwrap();
        assert_eq!(storage.property("k").as_deref(), Some("v2"));
        assert!(storage.remove_property("k").unwrap());
        assert!(!storage.remove_property("k").unwrap());
        assert!(storage.set_property(" ", String::new()).is_err());
    }
}
