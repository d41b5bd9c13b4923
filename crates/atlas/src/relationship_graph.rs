//! One storage, one path cache and one traverser, kept in step.
//!
//! [`RelationshipGraph`] is the entry point most callers want. Inserting
//! relationships through it extends every view cache built so far, so
//! queries against those views stay current without walking them again.

use crate::cache::persist::{self, RestoreReport};
use crate::cache::{PathCache, ViewCache};
use crate::domain::{ProjectRelationship, ProjectVersionRef, RelationshipId};
use crate::error::Result;
use crate::graph::{CyclePath, GraphPath, GraphView};
use crate::storage::GraphStorage;
use crate::storage::in_memory::InMemoryStorage;
use crate::traverse::{CacheWarming, GraphTraverser, Traversal, TraversalSummary};
use std::sync::Arc;
use tracing::debug;

/// A relationship graph with view-scoped path caches.
#[derive(Debug)]
pub struct RelationshipGraph {
    traverser: GraphTraverser,
}

impl RelationshipGraph {
    /// Wrap `storage` with a fresh, empty path cache.
    pub fn new(storage: Arc<dyn GraphStorage>) -> Self {
        Self {
            traverser: GraphTraverser::new(storage, Arc::new(PathCache::new())),
        }
    }

    /// An empty in-memory graph.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()))
    }

    /// The underlying storage.
    pub fn storage(&self) -> &Arc<dyn GraphStorage> {
        self.traverser.storage()
    }

    /// The path caches, one per view traversed so far.
    pub fn cache(&self) -> &Arc<PathCache> {
        self.traverser.cache()
    }

    /// Insert relationships and extend every existing view cache with the
    /// ones that were new. Returns the new ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRelationship` for malformed input, or storage
    /// errors from the insert or the cache extension.
    pub fn add_relationships(&self, relationships: &[ProjectRelationship]) -> Result<Vec<RelationshipId>> {
        let added = self.storage().add_relationships(relationships)?;
        if added.is_empty() {
            return Ok(added);
        }
        for cache in self.cache().views() {
            let summary = self
                .traverser
                .resume(cache.view(), &added, &mut CacheWarming)?;
            debug!(view = %summary.view, new_paths = summary.new_paths, "Extended view cache");
        }
        Ok(added)
    }

    /// Run `traversal` over `view`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors; the pass is aborted.
    pub fn traverse(&self, view: &GraphView, traversal: &mut dyn Traversal) -> Result<TraversalSummary> {
        self.traverser.traverse(view, traversal)
    }

    fn cached(&self, view: &GraphView) -> Result<Arc<ViewCache>> {
        if let Some(cache) = self.cache().get(view) {
            return Ok(cache);
        }
        self.traverser.traverse(view, &mut CacheWarming)?;
        Ok(self.cache().view(view))
    }

    /// Cycles reachable in `view`, traversing it first if needed.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the traversal.
    pub fn cycles(&self, view: &GraphView) -> Result<Vec<CyclePath>> {
        Ok(self.cached(view)?.cycles())
    }

    /// Known paths from the roots of `view` to `target`, shortest first.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the traversal.
    pub fn paths_to(&self, view: &GraphView, target: &ProjectVersionRef) -> Result<Vec<GraphPath>> {
        Ok(self.cached(view)?.paths_to(target.node_id()))
    }

    /// Whether `project` lies on a cycle reachable in `view`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the traversal.
    pub fn is_cycle_participant(&self, view: &GraphView, project: &ProjectVersionRef) -> Result<bool> {
        Ok(self.cached(view)?.is_cycle_participant(project.node_id()))
    }

    /// Whether inserting `relationship` would close a cycle in storage.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn introduces_cycle(&self, relationship: &ProjectRelationship) -> Result<bool> {
        self.storage().introduces_cycle(relationship)
    }

    /// Resolve the relationships of `path`, in walk order.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` if an id does not resolve.
    pub fn resolve_path(&self, path: &GraphPath) -> Result<Vec<Arc<ProjectRelationship>>> {
        self.resolve(path.relationships())
    }

    /// Resolve relationship ids, in order.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` if an id does not resolve.
    pub fn resolve(&self, ids: &[RelationshipId]) -> Result<Vec<Arc<ProjectRelationship>>> {
        ids.iter().map(|&id| self.storage().relationship(id)).collect()
    }

    /// Save `view`'s cache into storage. Returns the number of paths saved,
    /// zero when the view has no cache.
    ///
    /// # Errors
    ///
    /// Returns serialization or storage errors.
    pub fn persist_cache(&self, view: &GraphView) -> Result<usize> {
        match self.cache().get(view) {
            Some(cache) => persist::persist(&cache, self.storage().as_ref()),
            None => Ok(0),
        }
    }

    /// Load `view`'s cache from storage, if a current one was saved.
    ///
    /// When nothing usable is saved the view is left uncached, so the next
    /// query walks it.
    ///
    /// # Errors
    ///
    /// Returns errors for corrupt or mismatched blobs.
    pub fn restore_cache(&self, view: &GraphView) -> Result<Option<RestoreReport>> {
        let existed = self.cache().get(view).is_some();
        let restored = persist::restore(&self.cache().view(view), self.storage().as_ref());
        if !existed && !matches!(restored, Ok(Some(_))) {
            self.cache().remove(view);
        }
        restored
    }
}

impl Default for RelationshipGraph {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactRef, DependencyScope};

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

    #[test]
    fn test_queries_traverse_lazily() {
        let graph = RelationshipGraph::in_memory();
        graph.add_relationships(&[dep("g:a:1", "g:b:1")]).unwrap();
        let view = GraphView::new("ws", [pvr("g:a:1")]);

        assert!(graph.cache().get(&view).is_none());
        assert_eq!(graph.paths_to(&view, &pvr("g:b:1")).unwrap().len(), 1);
        assert!(graph.cache().get(&view).is_some());
    }

    #[test]
    fn test_insert_extends_existing_views() {
        let graph = RelationshipGraph::in_memory();
        graph.add_relationships(&[dep("g:a:1", "g:b:1")]).unwrap();
        let view = GraphView::new("ws", [pvr("g:a:1")]);
        graph.cycles(&view).unwrap();

        graph.add_relationships(&[dep("g:b:1", "g:c:1")]).unwrap();
        let paths = graph.paths_to(&view, &pvr("g:c:1")).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 2);

        graph.add_relationships(&[dep("g:c:1", "g:a:1")]).unwrap();
        assert_eq!(graph.cycles(&view).unwrap().len(), 1);
        assert!(graph.is_cycle_participant(&view, &pvr("g:b:1")).unwrap());
    }

    #[test]
    fn test_restore_without_blob_leaves_view_uncached() {
        let graph = RelationshipGraph::in_memory();
        graph.add_relationships(&[dep("g:a:1", "g:b:1")]).unwrap();
        let view = GraphView::new("ws", [pvr("g:a:1")]);

        assert!(graph.restore_cache(&view).unwrap().is_none());
        assert!(graph.cache().get(&view).is_none());
        assert_eq!(graph.paths_to(&view, &pvr("g:b:1")).unwrap().len(), 1);
    }

    #[test]
    fn test_persisted_cache_survives_reload() {
        let storage = Arc::new(InMemoryStorage::new());
        let graph = RelationshipGraph::new(Arc::clone(&storage) as Arc<dyn GraphStorage>);
        graph
            .add_relationships(&[dep("g:a:1", "g:b:1"), dep("g:b:1", "g:a:1")])
            .unwrap();
        let view = GraphView::new("ws", [pvr("g:a:1")]);
        assert_eq!(graph.cycles(&view).unwrap().len(), 1);
        assert_eq!(graph.persist_cache(&view).unwrap(), 2);

        let reloaded = RelationshipGraph::new(storage);
        let report = reloaded.restore_cache(&view).unwrap().unwrap();
        assert_eq!(report.paths, 2);
        assert_eq!(report.cycles, 1);
        assert!(reloaded.is_cycle_participant(&view, &pvr("g:b:1")).unwrap());
    }

    #[test]
    fn test_reinserting_is_quiet() {
        let graph = RelationshipGraph::in_memory();
        let rel = dep("g:a:1", "g:b:1");
        assert_eq!(graph.add_relationships(&[rel.clone()]).unwrap().len(), 1);
        assert!(graph.add_relationships(&[rel]).unwrap().is_empty());
    }
}
