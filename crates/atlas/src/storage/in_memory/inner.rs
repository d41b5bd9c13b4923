//! Core in-memory storage data structures.
//!
//! This module contains the inner storage structure that holds all data
//! and is wrapped in a `RwLock` for thread safety.

use crate::domain::{NodeId, ProjectRelationship, ProjectVersionRef, RelationshipId};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Inner storage structure (not thread-safe).
pub(crate) struct InMemoryStorageInner {
    /// Relationship graph. Nodes hold the project, edges hold the id of the
    /// relationship they stand for.
    pub(super) graph: StableDiGraph<ProjectVersionRef, RelationshipId>,

    /// Mapping from `NodeId` to graph `NodeIndex`.
    ///
    /// Every node in `graph` has an entry here.
    pub(super) node_map: HashMap<NodeId, NodeIndex>,

    /// Relationship values by id. Every edge weight in `graph` is a key.
    pub(super) relationships: HashMap<RelationshipId, Arc<ProjectRelationship>>,

    /// Named property blobs, sorted for deterministic export
    pub(super) properties: BTreeMap<String, String>,
}

impl InMemoryStorageInner {
    /// Create a new empty storage instance
    pub(crate) fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
            relationships: HashMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Find or create the node for `project`.
    pub(super) fn ensure_node(&mut self, project: &ProjectVersionRef) -> NodeIndex {
        let id = project.node_id();
        if let Some(&index) = self.node_map.get(&id) {
            return index;
        }
        let index = self.graph.add_node(project.clone());
        self.node_map.insert(id, index);
        index
    }

    /// Insert one relationship. Returns its id if it was not stored yet.
    pub(super) fn insert(&mut self, relationship: &ProjectRelationship) -> Option<RelationshipId> {
        let id = relationship.id();
        if self.relationships.contains_key(&id) {
            return None;
        }
        let from = self.ensure_node(relationship.declaring());
        let to = self.ensure_node(relationship.target());
        self.graph.add_edge(from, to, id);
        self.relationships.insert(id, Arc::new(relationship.clone()));
        Some(id)
    }
}
