use crate::domain::{ProjectRelationship, RelationshipId};
use crate::graph::{CyclePath, GraphPath, ProjectRelationshipFilter};
use crate::traverse::{Traversal, TraversalType};
use std::collections::HashSet;
use std::sync::Arc;

/// Records every relationship the view follows, once each, in visit order.
///
/// An optional extra filter narrows what is recorded and followed beyond
/// what the view itself allows.
#[derive(Debug, Default)]
pub struct FilteringTraversal {
    filter: Option<Arc<dyn ProjectRelationshipFilter>>,
    captured: Vec<ProjectRelationship>,
    ids: HashSet<RelationshipId>,
    cycles: Vec<CyclePath>,
    order: TraversalType,
}

impl FilteringTraversal {
    /// Capture everything the view follows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture and follow only what `filter` also accepts.
    pub fn with_filter(filter: Arc<dyn ProjectRelationshipFilter>) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Walk in `order` instead of depth-first.
    #[must_use]
    pub fn with_traversal_type(mut self, order: TraversalType) -> Self {
        self.order = order;
        self
    }

    /// Captured relationships, as selected by the view.
    pub fn relationships(&self) -> &[ProjectRelationship] {
        &self.captured
    }

    /// Cycles reported during the traversal.
    pub fn cycles(&self) -> &[CyclePath] {
        &self.cycles
    }

    /// Take the captured relationships.
    pub fn into_relationships(self) -> Vec<ProjectRelationship> {
        self.captured
    }
}

impl Traversal for FilteringTraversal {
    fn traverse_edge(&mut self, relationship: &ProjectRelationship, _path: &GraphPath) -> bool {
        if self
            .filter
            .as_ref()
            .is_some_and(|filter| !filter.accept(relationship))
        {
            return false;
        }
        if self.ids.insert(relationship.id()) {
            self.captured.push(relationship.clone());
        }
        true
    }

    fn cycle_detected(&mut self, cycle: &CyclePath, _relationship: &ProjectRelationship) {
        self.cycles.push(cycle.clone());
    }

    fn traversal_type(&self, _pass: usize) -> TraversalType {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PathCache;
    use crate::domain::{ArtifactRef, DependencyScope, ProjectVersionRef};
    use crate::graph::{GraphView, KindFilter};
    use crate::storage::GraphStorage;
    use crate::storage::in_memory::InMemoryStorage;
    use crate::traverse::GraphTraverser;

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    #[test]
    fn test_extra_filter_narrows_capture() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[
                ProjectRelationship::parent(pvr("g:app:1"), pvr("g:parent:1")),
                ProjectRelationship::dependency(
                    pvr("g:app:1"),
                    ArtifactRef::jar(pvr("g:lib:1")),
                    DependencyScope::Compile,
                    0,
                    false,
                ),
            ])
            .unwrap();
        let traverser = GraphTraverser::new(Arc::new(storage), Arc::new(PathCache::new()));
        let view = GraphView::new("ws", [pvr("g:app:1")]);

        let mut everything = FilteringTraversal::new();
        traverser.traverse(&view, &mut everything).unwrap();
        assert_eq!(everything.relationships().len(), 2);

        let mut parents = FilteringTraversal::with_filter(Arc::new(KindFilter::parents()));
        traverser.traverse(&view, &mut parents).unwrap();
        assert_eq!(parents.relationships().len(), 1);
        assert_eq!(parents.relationships()[0].target(), &pvr("g:parent:1"));
    }
}
