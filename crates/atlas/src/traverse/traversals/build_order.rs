use crate::domain::{ProjectRelationship, ProjectVersionRef};
use crate::graph::{CyclePath, GraphPath, GraphView};
use crate::traverse::Traversal;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Orders the projects reachable in a view so that every project comes
/// after the projects it depends on.
///
/// Edges that close a cycle are left out of the ordering; the projects on
/// such cycles are reported separately. Participants are computed from the
/// edges this traversal followed, so they are reported even when the view's
/// cycles were registered by an earlier traversal.
#[derive(Debug, Default)]
pub struct BuildOrderTraversal {
    roots: Vec<ProjectVersionRef>,
    edges: HashMap<ProjectVersionRef, Vec<ProjectVersionRef>>,
    cycles: Vec<CyclePath>,
    order: Vec<ProjectVersionRef>,
}

impl BuildOrderTraversal {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects in build order, dependencies first. Available once the
    /// traversal has completed.
    pub fn build_order(&self) -> &[ProjectVersionRef] {
        &self.order
    }

    /// Cycles newly registered with the view cache during this traversal.
    pub fn cycles(&self) -> &[CyclePath] {
        &self.cycles
    }

    /// Projects on at least one cycle among the followed edges, sorted.
    pub fn cycle_participants(&self) -> BTreeSet<ProjectVersionRef> {
        let mut graph = DiGraph::<&ProjectVersionRef, ()>::new();
        let mut index = HashMap::new();
        for (from, targets) in &self.edges {
            let from = *index.entry(from).or_insert_with(|| graph.add_node(from));
            for target in targets {
                let target = *index.entry(target).or_insert_with(|| graph.add_node(target));
                graph.add_edge(from, target, ());
            }
        }
        tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .flatten()
            .map(|node| graph[node].clone())
            .collect()
    }

    fn compute_order(&mut self) {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut on_stack = HashSet::new();
        for root in &self.roots {
            self.post_order(root, &mut done, &mut on_stack, &mut order);
        }
        self.order = order;
    }

    fn post_order(
        &self,
        project: &ProjectVersionRef,
        done: &mut HashSet<ProjectVersionRef>,
        on_stack: &mut HashSet<ProjectVersionRef>,
        order: &mut Vec<ProjectVersionRef>,
    ) {
        if done.contains(project) || !on_stack.insert(project.clone()) {
            return;
        }
        if let Some(next) = self.edges.get(project) {
            for dependency in next {
                self.post_order(dependency, done, on_stack, order);
            }
        }
        on_stack.remove(project);
        done.insert(project.clone());
        order.push(project.clone());
    }
}

impl Traversal for BuildOrderTraversal {
    fn start_traverse(&mut self, _pass: usize, view: &GraphView) {
        self.roots = view.roots().to_vec();
        self.edges.clear();
        self.cycles.clear();
    }

    fn end_traverse(&mut self, _pass: usize, _view: &GraphView) {
        self.compute_order();
    }

    fn traverse_edge(&mut self, relationship: &ProjectRelationship, _path: &GraphPath) -> bool {
        if relationship.is_self_referential() {
            return false;
        }
        let declaring = relationship.declaring().clone();
        let target = relationship.target().clone();
        let next = self.edges.entry(declaring).or_default();
        if !next.contains(&target) {
            next.push(target);
        }
        true
    }

    fn cycle_detected(&mut self, cycle: &CyclePath, _relationship: &ProjectRelationship) {
        self.cycles.push(cycle.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PathCache;
    use crate::domain::{ArtifactRef, DependencyScope};
    use crate::storage::GraphStorage;
    use crate::storage::in_memory::InMemoryStorage;
    use crate::traverse::GraphTraverser;
    use std::sync::Arc;

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    fn dep(from: &str, to: &str) -> ProjectRelationship {
        ProjectRelationship::dependency(
            pvr(from),
            ArtifactRef::jar(pvr(to)),
            DependencyScope::Compile,
            0,
            false,
        )
    }

    fn position(order: &[ProjectVersionRef], gav: &str) -> usize {
        order.iter().position(|p| p == &pvr(gav)).unwrap()
    }

    #[test]
    fn test_dependencies_build_first() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[
                dep("g:app:1", "g:service:1"),
                dep("g:app:1", "g:util:1"),
                dep("g:service:1", "g:util:1"),
                ProjectRelationship::parent(pvr("g:util:1"), pvr("g:parent:1")),
            ])
            .unwrap();
        let traverser = GraphTraverser::new(Arc::new(storage), Arc::new(PathCache::new()));
        let view = GraphView::new("ws", [pvr("g:app:1")]);

        let mut build = BuildOrderTraversal::new();
        traverser.traverse(&view, &mut build).unwrap();
        let order = build.build_order();

        assert_eq!(order.len(), 4);
        assert!(position(order, "g:parent:1") < position(order, "g:util:1"));
        assert!(position(order, "g:util:1") < position(order, "g:service:1"));
        assert_eq!(order.last(), Some(&pvr("g:app:1")));
        assert!(build.cycles().is_empty());
    }

    #[test]
    fn test_cycle_participants_reported() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[
                dep("g:app:1", "g:a:1"),
                dep("g:a:1", "g:b:1"),
                dep("g:b:1", "g:a:1"),
            ])
            .unwrap();
        let traverser = GraphTraverser::new(Arc::new(storage), Arc::new(PathCache::new()));
        let view = GraphView::new("ws", [pvr("g:app:1")]);

        let mut build = BuildOrderTraversal::new();
        traverser.traverse(&view, &mut build).unwrap();

        let participants: Vec<_> = build.cycle_participants().into_iter().collect();
        assert_eq!(participants, vec![pvr("g:a:1"), pvr("g:b:1")]);
        assert_eq!(build.build_order().len(), 3);
    }

    #[test]
    fn test_participants_found_on_warm_cache() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[dep("g:a:1", "g:b:1"), dep("g:b:1", "g:a:1")])
            .unwrap();
        let traverser = GraphTraverser::new(Arc::new(storage), Arc::new(PathCache::new()));
        let view = GraphView::new("ws", [pvr("g:a:1")]);
        traverser.traverse(&view, &mut BuildOrderTraversal::new()).unwrap();

        let mut build = BuildOrderTraversal::new();
        traverser.traverse(&view, &mut build).unwrap();
        assert!(build.cycles().is_empty());
        assert_eq!(build.cycle_participants().len(), 2);
    }
}
