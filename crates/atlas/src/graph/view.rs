//! Graph views: the scope of a traversal and the key of its path cache.

use super::filter::{AnyFilter, ProjectRelationshipFilter};
use super::mutator::{GraphMutator, NoOpGraphMutator, Selections};
use super::path::GraphPath;
use super::path_info::{GraphPathInfo, PathEntry};
use crate::domain::{ProjectRef, ProjectVersionRef, ViewId};
use crate::error::Result;
use crate::storage::GraphStorage;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Which roots, filter and mutator a traversal runs with.
///
/// Two views are equal when their roots, filter and mutator (including
/// pinned selections) are equal; the workspace is a label only. Equal views
/// share one path-cache partition, identified by [`GraphView::id`].
#[derive(Clone)]
pub struct GraphView {
    workspace: String,
    roots: Vec<ProjectVersionRef>,
    filter: Option<Arc<dyn ProjectRelationshipFilter>>,
    mutator: Option<Arc<dyn GraphMutator>>,
    pinned: Arc<Selections>,
    long_id: String,
}

impl GraphView {
    /// An unfiltered, unmutated view over `roots`. Duplicate roots are
    /// dropped, keeping first occurrence order.
    pub fn new(workspace: impl Into<String>, roots: impl IntoIterator<Item = ProjectVersionRef>) -> Self {
        let mut unique = Vec::new();
        for root in roots {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        let mut view = Self {
            workspace: workspace.into(),
            roots: unique,
            filter: None,
            mutator: None,
            pinned: Arc::default(),
            long_id: String::new(),
        };
        view.refresh_id();
        view
    }

    /// Restrict the view with `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn ProjectRelationshipFilter>) -> Self {
        self.filter = Some(filter);
        self.refresh_id();
        self
    }

    /// Select versions with `mutator`.
    #[must_use]
    pub fn with_mutator(mut self, mutator: Arc<dyn GraphMutator>) -> Self {
        self.mutator = Some(mutator);
        self.refresh_id();
        self
    }

    /// Pin `project` to `version`, overriding any mutator.
    #[must_use]
    pub fn with_selection(mut self, version: ProjectVersionRef) -> Self {
        let mut pinned = (*self.pinned).clone();
        pinned.insert(version.project().clone(), version);
        self.pinned = Arc::new(pinned);
        self.refresh_id();
        self
    }

    fn refresh_id(&mut self) {
        let roots: Vec<String> = self.roots.iter().map(ToString::to_string).collect();
        let pinned: Vec<String> = self.pinned.values().map(ToString::to_string).collect();
        self.long_id = format!(
            "roots[{}] filter[{}] mutator[{}] pinned[{}]",
            roots.join(","),
            self.filter.as_ref().map_or_else(|| AnyFilter.long_id(), |f| f.long_id()),
            self.mutator
                .as_ref()
                .map_or_else(|| NoOpGraphMutator.long_id(), |m| m.long_id()),
            pinned.join(",")
        );
    }

    /// The workspace label.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// The roots, in order.
    pub fn roots(&self) -> &[ProjectVersionRef] {
        &self.roots
    }

    /// Whether `project` is one of the roots.
    pub fn is_root(&self, project: &ProjectVersionRef) -> bool {
        self.roots.contains(project)
    }

    /// Explicitly pinned versions.
    pub fn pinned(&self) -> &Selections {
        &self.pinned
    }

    /// The pinned version for `project`, if any.
    pub fn selection(&self, project: &ProjectRef) -> Option<&ProjectVersionRef> {
        self.pinned.get(project)
    }

    /// Full identity string.
    pub fn long_id(&self) -> &str {
        &self.long_id
    }

    /// Short stable id, used as the cache partition key.
    pub fn id(&self) -> ViewId {
        ViewId::for_key(&self.long_id)
    }

    /// The path entry a traversal starts from at `root`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from seeding the mutator.
    pub fn root_entry(&self, root: &ProjectVersionRef, storage: &dyn GraphStorage) -> Result<PathEntry> {
        let filter: Arc<dyn ProjectRelationshipFilter> =
            self.filter.clone().unwrap_or_else(|| Arc::new(AnyFilter));
        let base: Arc<dyn GraphMutator> = self
            .mutator
            .clone()
            .unwrap_or_else(|| Arc::new(NoOpGraphMutator));
        let mutator = base.mutator_for_root(root, storage)?.unwrap_or(base);
        Ok(PathEntry::new(
            GraphPath::root(root.node_id()),
            GraphPathInfo::new(filter, mutator, Arc::clone(&self.pinned)),
        ))
    }
}

impl PartialEq for GraphView {
    fn eq(&self, other: &Self) -> bool {
        self.long_id == other.long_id
    }
}

impl Eq for GraphView {}

impl Hash for GraphView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.long_id.hash(state);
    }
}

impl fmt::Debug for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphView")
            .field("workspace", &self.workspace)
            .field("id", &self.id())
            .field("long_id", &self.long_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyScope;
    use crate::graph::filter::DependencyFilter;
    use crate::graph::mutator::ManagedDependencyMutator;

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    #[test]
    fn test_workspace_does_not_affect_identity() {
        let a = GraphView::new("one", [pvr("g:a:1")]);
        let b = GraphView::new("two", [pvr("g:a:1")]);
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_filter_mutator_and_roots_affect_identity() {
        let base = GraphView::new("ws", [pvr("g:a:1")]);
        let filtered = base
            .clone()
            .with_filter(Arc::new(DependencyFilter::new(DependencyScope::Runtime)));
        let mutated = base
            .clone()
            .with_mutator(Arc::new(ManagedDependencyMutator::new()));
        let pinned = base.clone().with_selection(pvr("g:x:2"));
        let other_root = GraphView::new("ws", [pvr("g:b:1")]);

        for other in [&filtered, &mutated, &pinned, &other_root] {
            assert_ne!(&base, other);
            assert_ne!(base.id(), other.id());
        }
    }

    #[test]
    fn test_seeded_mutators_affect_identity() {
        let seeded = |version: &str| {
            let mut selections = Selections::new();
            selections.insert(ProjectRef::new("g", "lib").unwrap(), pvr(version));
            GraphView::new("ws", [pvr("g:a:1")])
                .with_mutator(Arc::new(ManagedDependencyMutator::with_selections(selections)))
        };
        let unseeded = GraphView::new("ws", [pvr("g:a:1")])
            .with_mutator(Arc::new(ManagedDependencyMutator::new()));

        assert_ne!(seeded("g:lib:9"), unseeded);
        assert_ne!(seeded("g:lib:9").id(), seeded("g:lib:8").id());
        assert_eq!(seeded("g:lib:9").id(), seeded("g:lib:9").id());
    }

    #[test]
    fn test_duplicate_roots_dropped() {
        let view = GraphView::new("ws", [pvr("g:a:1"), pvr("g:b:1"), pvr("g:a:1")]);
        assert_eq!(view.roots(), &[pvr("g:a:1"), pvr("g:b:1")]);
    }
}
