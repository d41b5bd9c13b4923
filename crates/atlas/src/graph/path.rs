//! Graph paths and cycle paths.
//!
//! A [`GraphPath`] is the walk from a view root to some node: the ordered
//! relationship ids, plus the node each step landed on. The landing node is
//! the *effective* target, after version selection, so it can differ from
//! the target stored on the relationship. Keeping it on the path lets cycle
//! extraction work without going back to storage.

use crate::domain::{NodeId, RelationshipId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable walk from a root node.
///
/// `nodes[0]` is the root and `nodes[i + 1]` is where relationship `i`
/// landed, so `nodes.len() == relationships.len() + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphPath {
    relationships: Vec<RelationshipId>,
    nodes: Vec<NodeId>,
}

impl GraphPath {
    /// The empty path sitting at `root`.
    pub fn root(root: NodeId) -> Self {
        Self {
            relationships: Vec::new(),
            nodes: vec![root],
        }
    }

    /// A new path one step longer. `self` is unchanged.
    #[must_use]
    pub fn append(&self, relationship: RelationshipId, landed_on: NodeId) -> Self {
        let mut relationships = Vec::with_capacity(self.relationships.len() + 1);
        relationships.extend_from_slice(&self.relationships);
        relationships.push(relationship);

        let mut nodes = Vec::with_capacity(self.nodes.len() + 1);
        nodes.extend_from_slice(&self.nodes);
        nodes.push(landed_on);

        Self {
            relationships,
            nodes,
        }
    }

    /// Concatenate `suffix`, which must start where `self` ends.
    ///
    /// Returns `None` if the ends do not meet.
    pub fn concat(&self, suffix: &GraphPath) -> Option<Self> {
        if suffix.origin() != self.terminal() {
            return None;
        }
        let mut joined = self.clone();
        joined.relationships.extend_from_slice(&suffix.relationships);
        joined.nodes.extend_from_slice(&suffix.nodes[1..]);
        Some(joined)
    }

    /// The root node this path starts from.
    pub fn origin(&self) -> NodeId {
        self.nodes[0]
    }

    /// The node this path ends on.
    pub fn terminal(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// The relationship ids, in walk order.
    pub fn relationships(&self) -> &[RelationshipId] {
        &self.relationships
    }

    /// The nodes visited, root first.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The last relationship walked, if any.
    pub fn last_relationship(&self) -> Option<RelationshipId> {
        self.relationships.last().copied()
    }

    /// Number of relationships walked.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Whether this is a bare root.
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Whether `relationship` is part of this path.
    pub fn contains(&self, relationship: RelationshipId) -> bool {
        self.relationships.contains(&relationship)
    }

    /// The first cycle this path closes, if any.
    ///
    /// Scans the relationships in order; the first one that lands on a node
    /// already visited closes a cycle made of every relationship from that
    /// node's departure up to and including itself.
    pub fn terminating_cycle(&self) -> Option<CyclePath> {
        terminating_cycle(&self.relationships, &self.nodes)
    }
}

impl fmt::Display for GraphPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin())?;
        for (rel, node) in self.relationships.iter().zip(&self.nodes[1..]) {
            write!(f, " -{rel}-> {node}")?;
        }
        Ok(())
    }
}

/// Extract the first cycle from parallel relationship and node sequences,
/// where `nodes[i]` is the start of `relationships[i]` and `nodes[i + 1]`
/// its end.
pub fn terminating_cycle(relationships: &[RelationshipId], nodes: &[NodeId]) -> Option<CyclePath> {
    for i in 0..relationships.len() {
        let end = *nodes.get(i + 1)?;
        if let Some(start) = nodes[..=i].iter().position(|&n| n == end) {
            return Some(CyclePath::new(
                relationships[start..=i].to_vec(),
                nodes[start..=i].to_vec(),
            ));
        }
    }
    None
}

/// A closed walk through the graph.
///
/// Identity is the **set** of member relationships: the same loop entered
/// at a different point is the same cycle. The entry point records where a
/// traversal happened to enter it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CyclePath {
    relationships: Vec<RelationshipId>,
    nodes: Vec<NodeId>,
    entry_point: RelationshipId,
}

impl CyclePath {
    /// Build a cycle from its members in walk order. `nodes[i]` is where
    /// member `i` departs from. The entry point is the first member, so
    /// `relationships` must not be empty.
    fn new(relationships: Vec<RelationshipId>, nodes: Vec<NodeId>) -> Self {
        let entry_point = relationships[0];
        Self {
            relationships,
            nodes,
            entry_point,
        }
    }

    /// The same cycle, rotated to start at member `index`.
    #[must_use]
    pub fn rotated(&self, index: usize) -> Self {
        let mut relationships = self.relationships.clone();
        let mut nodes = self.nodes.clone();
        if !relationships.is_empty() && relationships.len() == nodes.len() {
            relationships.rotate_left(index % self.relationships.len());
            nodes.rotate_left(index % self.relationships.len());
        }
        let entry_point = relationships.first().copied().unwrap_or(self.entry_point);
        Self {
            relationships,
            nodes,
            entry_point,
        }
    }

    /// Members in walk order, starting at the entry point.
    pub fn relationships(&self) -> &[RelationshipId] {
        &self.relationships
    }

    /// Departure node of each member, in walk order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The member through which traversal entered the cycle.
    pub fn entry_point(&self) -> RelationshipId {
        self.entry_point
    }

    /// The identity of this cycle.
    pub fn key(&self) -> BTreeSet<RelationshipId> {
        self.relationships.iter().copied().collect()
    }

    /// Whether this cycle passes through `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Whether `relationship` is a member.
    pub fn contains(&self, relationship: RelationshipId) -> bool {
        self.relationships.contains(&relationship)
    }

    /// Whether the cycle spans no distinct nodes: a relationship pointing
    /// back at its own declaring node.
    pub fn is_degenerate(&self) -> bool {
        let distinct: BTreeSet<&NodeId> = self.nodes.iter().collect();
        self.relationships.is_empty() || distinct.len() < 2
    }

    /// Whether the member and node lists line up. Always true for cycles
    /// built here; checked on cycles read back from persisted caches.
    pub fn is_well_formed(&self) -> bool {
        !self.relationships.is_empty()
            && self.relationships.len() == self.nodes.len()
            && self.relationships.contains(&self.entry_point)
    }

    /// Number of member relationships.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Always false for cycles that came out of [`terminating_cycle`].
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

impl PartialEq for CyclePath {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CyclePath {}

impl Hash for CyclePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
