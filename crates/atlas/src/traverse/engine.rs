//! The traversal driver.

use super::seen::SeenTracker;
use super::{Traversal, TraversalState, TraversalType};
use crate::cache::{CacheOutcome, PathCache, ViewCache};
use crate::domain::{ProjectRelationship, RelationshipId, ViewId, canonical_order};
use crate::error::Result;
use crate::graph::{GraphPath, GraphView, PathEntry};
use crate::storage::GraphStorage;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace, warn};

/// What a call to [`GraphTraverser::traverse`] or
/// [`GraphTraverser::resume`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraversalSummary {
    /// The view traversed
    pub view: ViewId,
    /// Passes run
    pub passes: usize,
    /// Final state of the last pass
    pub state: TraversalState,
    /// Edges followed, summed over passes
    pub edges: usize,
    /// Paths added to the view cache
    pub new_paths: usize,
    /// Cycles registered with the view cache
    pub new_cycles: usize,
}

impl TraversalSummary {
    fn new(view: ViewId) -> Self {
        Self {
            view,
            passes: 0,
            state: TraversalState::NotStarted,
            edges: 0,
            new_paths: 0,
            new_cycles: 0,
        }
    }
}

/// Per-pass context.
struct Pass<'a> {
    id: u64,
    cache: &'a ViewCache,
    edges: usize,
}

/// Walks views over a shared storage, filling a shared path cache.
///
/// A traverser may be used from several threads at once. Each pass gets a
/// fresh id, and all per-pass state is keyed by it and dropped when the
/// pass ends, whether it completed or aborted.
pub struct GraphTraverser {
    storage: Arc<dyn GraphStorage>,
    cache: Arc<PathCache>,
    seen: SeenTracker,
    next_id: AtomicU64,
}

impl GraphTraverser {
    /// A traverser over `storage`, caching into `cache`.
    pub fn new(storage: Arc<dyn GraphStorage>, cache: Arc<PathCache>) -> Self {
        Self {
            storage,
            cache,
            seen: SeenTracker::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// The path cache this traverser fills.
    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    /// The storage this traverser walks.
    pub fn storage(&self) -> &Arc<dyn GraphStorage> {
        &self.storage
    }

    fn next_pass_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Run every pass `traversal` asks for over `view`.
    ///
    /// All roots are walked within each pass. Every path followed is offered
    /// to the view's cache; cycles are registered there and reported to the
    /// traversal.
    ///
    /// # Errors
    ///
    /// Storage errors abort the pass. Per-pass state is still cleared.
    pub fn traverse(&self, view: &GraphView, traversal: &mut dyn Traversal) -> Result<TraversalSummary> {
        let cache = self.cache.view(view);
        let mut summary = TraversalSummary::new(view.id());
        let paths_before = cache.path_count();
        let cycles_before = cache.cycles().len();

        for pass_index in 0..traversal.required_passes() {
            let mut pass = Pass {
                id: self.next_pass_id(),
                cache: &cache,
                edges: 0,
            };
            let order = traversal.traversal_type(pass_index);
            debug!(view = %view.id(), pass = pass_index, traversal = pass.id, %order, "Starting traversal pass");
            summary.state = TraversalState::Running;

            let outcome = self.run_pass(&mut pass, pass_index, order, traversal);
            self.complete_pass(&pass);
            summary.passes += 1;
            summary.edges += pass.edges;

            if let Err(e) = outcome {
                summary.state = TraversalState::Aborted;
                warn!(view = %view.id(), pass = pass_index, error = %e, "Traversal pass aborted");
                return Err(e);
            }
            summary.state = TraversalState::Completed;
        }

        summary.new_paths = cache.path_count().saturating_sub(paths_before);
        summary.new_cycles = cache.cycles().len().saturating_sub(cycles_before);
        info!(
            view = %view.id(),
            passes = summary.passes,
            edges = summary.edges,
            new_paths = summary.new_paths,
            new_cycles = summary.new_cycles,
            "Traversal complete"
        );
        Ok(summary)
    }

    fn run_pass(
        &self,
        pass: &mut Pass<'_>,
        pass_index: usize,
        order: TraversalType,
        traversal: &mut dyn Traversal,
    ) -> Result<()> {
        let view = pass.cache.view();
        traversal.start_traverse(pass_index, view);

        let mut roots = Vec::with_capacity(view.roots().len());
        for root in view.roots() {
            let entry = view.root_entry(root, self.storage.as_ref())?;
            pass.cache.cache_path(entry.clone(), self.storage.as_ref());
            roots.push(entry);
        }
        self.walk(pass, order, traversal, roots)?;

        traversal.end_traverse(pass_index, view);
        Ok(())
    }

    /// Extend a view's cache with relationships inserted since it was last
    /// traversed, without walking it again from the roots.
    ///
    /// Each new relationship is spliced onto every cached path ending at its
    /// declaring node, as it stood before the splice began. The spliced
    /// step goes through the same visitor hooks as a normal walk, and
    /// traversal continues below each spliced path as usual. A relationship
    /// with nothing to splice onto is not marked as followed, so a walk
    /// reaching its declaring node later in the same pass still takes it. Views with no
    /// cache yet are left alone; their first traversal will see everything.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` for ids not in storage, and
    /// propagates storage errors from the walk.
    pub fn resume(
        &self,
        view: &GraphView,
        new_relationships: &[RelationshipId],
        traversal: &mut dyn Traversal,
    ) -> Result<TraversalSummary> {
        let mut summary = TraversalSummary::new(view.id());
        let Some(cache) = self.cache.get(view) else {
            trace!(view = %view.id(), "No cache to resume");
            return Ok(summary);
        };

        let mut relationships = new_relationships
            .iter()
            .map(|&id| self.storage.relationship(id))
            .collect::<Result<Vec<_>>>()?;
        relationships.sort_by(|a, b| {
            a.declaring()
                .cmp(b.declaring())
                .then_with(|| canonical_order(a, b))
        });

        let paths_before = cache.path_count();
        let cycles_before = cache.cycles().len();
        let mut pass = Pass {
            id: self.next_pass_id(),
            cache: &cache,
            edges: 0,
        };
        let order = traversal.traversal_type(0);
        summary.state = TraversalState::Running;

        // Snapshot the prefixes first so paths produced by one splice are
        // not extended again by the next.
        for rel in &relationships {
            cache.mark_to_extend(pass.id, rel.declaring().node_id());
        }

        traversal.start_traverse(0, view);
        let outcome = relationships
            .iter()
            .try_for_each(|rel| self.splice(&mut pass, order, traversal, rel));
        self.complete_pass(&pass);
        summary.passes = 1;
        summary.edges = pass.edges;

        if let Err(e) = outcome {
            summary.state = TraversalState::Aborted;
            warn!(view = %view.id(), error = %e, "Resume aborted");
            return Err(e);
        }
        traversal.end_traverse(0, view);
        summary.state = TraversalState::Completed;
        summary.new_paths = cache.path_count().saturating_sub(paths_before);
        summary.new_cycles = cache.cycles().len().saturating_sub(cycles_before);
        debug!(
            view = %view.id(),
            relationships = relationships.len(),
            new_paths = summary.new_paths,
            "Resumed traversal"
        );
        Ok(summary)
    }

    fn splice(
        &self,
        pass: &mut Pass<'_>,
        order: TraversalType,
        traversal: &mut dyn Traversal,
        rel: &ProjectRelationship,
    ) -> Result<()> {
        let cache = pass.cache;
        let suffix = GraphPath::root(rel.declaring().node_id()).append(rel.id(), rel.target().node_id());
        // Once the relationship is followed, every other marked prefix is
        // extended by it as well.
        let mut followed = false;
        let splice = cache.including_child(pass.id, &suffix, self.storage.as_ref(), &mut |step| {
            if followed {
                return traversal.pre_check(step.relationship, step.parent);
            }
            followed = self.gate(pass, traversal, step.relationship, step.selected, step.parent, step.path);
            followed
        })?;
        for (cycle, selected) in &splice.cycles {
            traversal.cycle_detected(cycle, selected);
        }
        self.walk(pass, order, traversal, splice.extended)
    }

    /// Decide whether `rel`, selected as `selected`, is followed from
    /// `parent` onto `path`. Marks it seen when it is.
    fn gate(
        &self,
        pass: &mut Pass<'_>,
        traversal: &mut dyn Traversal,
        rel: &ProjectRelationship,
        selected: &ProjectRelationship,
        parent: &GraphPath,
        path: &GraphPath,
    ) -> bool {
        if !traversal.pre_check(rel, parent) {
            return false;
        }
        let view_id = pass.cache.view().id();
        if self.seen.has_seen(view_id, pass.id, rel.id()) {
            // Already followed in this pass. Only a cycle it closes on this
            // path is still news.
            return path.terminating_cycle().is_some();
        }
        if !traversal.traverse_edge(selected, path) {
            return false;
        }
        self.seen.mark(view_id, pass.id, rel.id());
        pass.edges += 1;
        true
    }

    fn walk(
        &self,
        pass: &mut Pass<'_>,
        order: TraversalType,
        traversal: &mut dyn Traversal,
        starts: Vec<PathEntry>,
    ) -> Result<()> {
        match order {
            TraversalType::DepthFirst => {
                for entry in &starts {
                    self.descend(pass, traversal, entry)?;
                }
            }
            TraversalType::BreadthFirst => {
                let mut queue: VecDeque<PathEntry> = starts.into();
                while let Some(entry) = queue.pop_front() {
                    for rel in self.storage.outgoing(entry.path.terminal())? {
                        if let Some(child) = self.visit_edge(pass, traversal, &entry, &rel)? {
                            queue.push_back(child);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn descend(&self, pass: &mut Pass<'_>, traversal: &mut dyn Traversal, entry: &PathEntry) -> Result<()> {
        for rel in self.storage.outgoing(entry.path.terminal())? {
            if let Some(child) = self.visit_edge(pass, traversal, entry, &rel)? {
                self.descend(pass, traversal, &child)?;
            }
        }
        Ok(())
    }

    /// Follow one edge from `parent`. Returns the entry to descend from, or
    /// `None` when the edge is pruned, already followed, or closes a cycle.
    fn visit_edge(
        &self,
        pass: &mut Pass<'_>,
        traversal: &mut dyn Traversal,
        parent: &PathEntry,
        rel: &ProjectRelationship,
    ) -> Result<Option<PathEntry>> {
        let Some(selected) = parent.info.select(rel) else {
            return Ok(None);
        };
        let path = parent.path.append(rel.id(), selected.target().node_id());
        if !self.gate(pass, traversal, rel, &selected, &parent.path, &path) {
            return Ok(None);
        }

        let info = parent.info.child(&selected, self.storage.as_ref())?;
        let entry = PathEntry::new(path, info);
        match pass.cache.cache_path(entry.clone(), self.storage.as_ref()) {
            CacheOutcome::Cached(_) | CacheOutcome::Duplicate => Ok(Some(entry)),
            CacheOutcome::Cycle(registered) => {
                if let Some(cycle) = registered {
                    traversal.cycle_detected(&cycle, &selected);
                }
                Ok(None)
            }
        }
    }

    fn complete_pass(&self, pass: &Pass<'_>) {
        pass.cache.traverse_completing(pass.id);
        self.seen.clear(pass.cache.view().id(), pass.id);
    }
}

impl std::fmt::Debug for GraphTraverser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphTraverser")
            .field("next_id", &self.next_id)
            .field("active_passes", &self.seen.active_passes())
            .finish_non_exhaustive()
    }
}
