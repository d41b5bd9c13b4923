//! Graph operations using petgraph.
//!
//! - Edge listing in canonical relationship order
//! - Cycle pre-checks for candidate relationships

use crate::domain::{NodeId, ProjectRelationship, RelationshipId, canonical_order};
use petgraph::Direction;
use petgraph::algo;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::sync::Arc;

/// Relationships attached to `node` in `direction`, sorted canonically.
///
/// Unknown nodes have no edges.
pub(super) fn edges_impl<N>(
    graph: &StableDiGraph<N, RelationshipId>,
    node_map: &HashMap<NodeId, NodeIndex>,
    relationships: &HashMap<RelationshipId, Arc<ProjectRelationship>>,
    node: NodeId,
    direction: Direction,
) -> Vec<Arc<ProjectRelationship>> {
    let Some(&index) = node_map.get(&node) else {
        return Vec::new();
    };
    let mut edges: Vec<Arc<ProjectRelationship>> = graph
        .edges_directed(index, direction)
        .filter_map(|edge| relationships.get(edge.weight()).cloned())
        .collect();
    edges.sort_by(|a, b| canonical_order(a, b));
    edges
}

/// Whether adding `relationship` would close a cycle.
///
/// Uses petgraph's `has_path_connecting`: if the target already reaches the
/// declaring node, the new edge closes the loop. Nodes missing from the
/// graph cannot be on a path, and self-referential relationships are
/// degenerate rather than cyclic.
pub(super) fn introduces_cycle_impl<N>(
    graph: &StableDiGraph<N, RelationshipId>,
    node_map: &HashMap<NodeId, NodeIndex>,
    relationship: &ProjectRelationship,
) -> bool {
    if relationship.is_self_referential() {
        return false;
    }
    let from = node_map.get(&relationship.declaring().node_id());
    let to = node_map.get(&relationship.target().node_id());
    match (from, to) {
        (Some(&from), Some(&to)) => algo::has_path_connecting(graph, to, from, None),
        _ => false,
    }
}
