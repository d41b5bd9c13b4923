use crate::domain::{ProjectRelationship, ProjectVersionRef, RelationshipKind};
use crate::graph::{GraphPath, GraphView};
use crate::traverse::Traversal;

/// Collects the parent chain of a view's first root: the root, its parent,
/// that parent's parent, and so on up to a terminal parent.
#[derive(Debug, Default)]
pub struct AncestryTraversal {
    ancestry: Vec<ProjectVersionRef>,
}

impl AncestryTraversal {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain, root first.
    pub fn ancestry(&self) -> &[ProjectVersionRef] {
        &self.ancestry
    }

    /// Whether `project` is in the chain.
    pub fn has_ancestor(&self, project: &ProjectVersionRef) -> bool {
        self.ancestry.iter().skip(1).any(|p| p == project)
    }
}

impl Traversal for AncestryTraversal {
    fn start_traverse(&mut self, _pass: usize, view: &GraphView) {
        self.ancestry.clear();
        self.ancestry.extend(view.roots().first().cloned());
    }

    fn pre_check(&mut self, relationship: &ProjectRelationship, path: &GraphPath) -> bool {
        // Only walk up from the first root
        relationship.kind() == RelationshipKind::Parent
            && self
                .ancestry
                .first()
                .is_some_and(|root| root.node_id() == path.origin())
    }

    fn traverse_edge(&mut self, relationship: &ProjectRelationship, _path: &GraphPath) -> bool {
        if relationship.is_self_referential() {
            return false;
        }
        self.ancestry.push(relationship.target().clone());
        true
    }
}
