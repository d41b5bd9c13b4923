//! View-scoped path caches.
//!
//! Every [`GraphView`] gets its own [`ViewCache`]: nothing discovered under
//! one view is visible from another. A view cache holds
//!
//! - **paths**, bucketed by the node they end on. Each stored path keeps the
//!   [`GraphPathInfo`](crate::graph::GraphPathInfo) in force at its end, so
//!   traversal can resume from any cached endpoint.
//! - **reverse indices** from relationship id and from node id to the
//!   stored paths that contain them.
//! - **cycles**, identified by their member set.
//! - a **to-extend** index, populated while new relationships are being
//!   spliced onto existing paths and cleared when that pass completes.
//!
//! Caches only grow. A path is never stored twice, and a cyclic path is
//! never stored at all: it registers a cycle instead.
//!
//! # Concurrency
//!
//! Buckets live in `DashMap`s. The existence check and insert for one
//! terminal node run under that bucket's shard lock, so concurrent writers
//! to the same bucket are serialized while readers of other buckets are not
//! blocked. Cycle registration runs its check-then-insert under a
//! `parking_lot::Mutex`.

pub mod cycles;
pub mod persist;

use crate::domain::{NodeId, ProjectRelationship, RelationshipId, ViewId};
use crate::error::Result;
use crate::graph::{CyclePath, GraphPath, GraphView, PathEntry};
use crate::storage::GraphStorage;
use cycles::CycleDetector;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::trace;

/// What happened to a path offered to the cache.
#[derive(Debug, Clone)]
pub enum CacheOutcome {
    /// Newly stored
    Cached(Arc<PathEntry>),
    /// Already stored; nothing changed
    Duplicate,
    /// The path closes a cycle and was not stored. Carries the cycle if it
    /// was newly registered, `None` if it was already known, degenerate, or
    /// not contained in the view.
    Cycle(Option<CyclePath>),
}

/// One relationship about to be appended to a marked prefix by
/// [`ViewCache::including_child`].
#[derive(Debug, Clone, Copy)]
pub struct SpliceStep<'a> {
    /// The stored relationship
    pub relationship: &'a ProjectRelationship,
    /// The relationship as the prefix's mutator selects it
    pub selected: &'a ProjectRelationship,
    /// The path being extended
    pub parent: &'a GraphPath,
    /// The path after the step
    pub path: &'a GraphPath,
}

/// Result of [`ViewCache::including_child`].
#[derive(Debug, Default)]
pub struct Splice {
    /// Extended entries that reached the end of the suffix, whether newly
    /// cached or already known
    pub extended: Vec<PathEntry>,
    /// Cycles newly registered while splicing, with the relationship that
    /// closed each
    pub cycles: Vec<(CyclePath, ProjectRelationship)>,
}

#[derive(Default)]
struct Bucket {
    keys: HashSet<GraphPath>,
    entries: Vec<Arc<PathEntry>>,
}

/// Path cache for one view.
pub struct ViewCache {
    view: GraphView,
    buckets: DashMap<NodeId, Bucket>,
    by_relationship: DashMap<RelationshipId, Vec<Arc<PathEntry>>>,
    by_node: DashMap<NodeId, Vec<Arc<PathEntry>>>,
    cycles: Mutex<BTreeMap<BTreeSet<RelationshipId>, CyclePath>>,
    to_extend: DashMap<(u64, NodeId), Vec<Arc<PathEntry>>>,
}

impl ViewCache {
    fn new(view: GraphView) -> Self {
        Self {
            view,
            buckets: DashMap::new(),
            by_relationship: DashMap::new(),
            by_node: DashMap::new(),
            cycles: Mutex::new(BTreeMap::new()),
            to_extend: DashMap::new(),
        }
    }

    /// The view this cache belongs to.
    pub fn view(&self) -> &GraphView {
        &self.view
    }

    /// Offer a path for caching.
    ///
    /// A path that closes a cycle goes to the cycle detector and is never
    /// stored. A path already stored is a no-op. Otherwise the path is
    /// stored with its info, under its terminal node, and indexed by every
    /// node and relationship it contains.
    pub fn cache_path(&self, entry: PathEntry, storage: &dyn GraphStorage) -> CacheOutcome {
        if let Some(cycle) = entry.path.terminating_cycle() {
            let injector = entry.path.last_relationship();
            let registered = injector
                .and_then(|injector| CycleDetector::new(self, storage).cycle_detected(cycle, injector));
            return CacheOutcome::Cycle(registered);
        }

        let terminal = entry.path.terminal();
        let entry = {
            let mut bucket = self.buckets.entry(terminal).or_default();
            if bucket.keys.contains(&entry.path) {
                trace!(view = %self.view.id(), path = %entry.path, "Path already cached");
                return CacheOutcome::Duplicate;
            }
            bucket.keys.insert(entry.path.clone());
            let entry = Arc::new(entry);
            bucket.entries.push(Arc::clone(&entry));
            entry
        };

        for &rel in entry.path.relationships() {
            self.by_relationship
                .entry(rel)
                .or_default()
                .push(Arc::clone(&entry));
        }
        for &node in entry.path.nodes() {
            self.by_node.entry(node).or_default().push(Arc::clone(&entry));
        }
        CacheOutcome::Cached(entry)
    }

    /// Splice `suffix` onto every path marked for extension at its origin.
    ///
    /// `suffix` is a walk starting at some node of this view, typically one
    /// freshly inserted relationship. For each prefix marked with
    /// [`ViewCache::mark_to_extend`] under `traversal_id` that ends at the
    /// suffix's origin, the suffix relationships are replayed on top of the
    /// prefix's info. Each step the view selects is offered to `follow`
    /// before it is cached. Replay of a prefix stops early where the view
    /// rejects a relationship, `follow` declines it, or a cycle closes.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelationshipNotFound` if a suffix relationship is not
    /// in storage.
    pub fn including_child(
        &self,
        traversal_id: u64,
        suffix: &GraphPath,
        storage: &dyn GraphStorage,
        follow: &mut dyn FnMut(SpliceStep<'_>) -> bool,
    ) -> Result<Splice> {
        let prefixes: Vec<Arc<PathEntry>> = self
            .to_extend
            .get(&(traversal_id, suffix.origin()))
            .map(|marked| marked.clone())
            .unwrap_or_default();

        let mut splice = Splice::default();
        'prefix: for prefix in prefixes {
            let mut current = (*prefix).clone();
            for &id in suffix.relationships() {
                let rel = storage.relationship(id)?;
                let Some(selected) = current.info.select(&rel) else {
                    continue 'prefix;
                };
                let path = current.path.append(id, selected.target().node_id());
                let step = SpliceStep {
                    relationship: &rel,
                    selected: &selected,
                    parent: &current.path,
                    path: &path,
                };
                if !follow(step) {
                    continue 'prefix;
                }
                let info = current.info.child(&selected, storage)?;
                current = PathEntry::new(path, info);
                if let CacheOutcome::Cycle(registered) = self.cache_path(current.clone(), storage) {
                    splice.cycles.extend(registered.map(|cycle| (cycle, selected)));
                    continue 'prefix;
                }
            }
            splice.extended.push(current);
        }
        Ok(splice)
    }

    /// Mark every path ending at `node` for extension during pass
    /// `traversal_id`. Returns how many were marked.
    pub fn mark_to_extend(&self, traversal_id: u64, node: NodeId) -> usize {
        let entries = self.entries_ending_at(node);
        let count = entries.len();
        if count > 0 {
            self.to_extend
                .entry((traversal_id, node))
                .or_default()
                .extend(entries);
        }
        count
    }

    /// Drop the transient state of pass `traversal_id`.
    pub fn traverse_completing(&self, traversal_id: u64) {
        self.to_extend.retain(|(id, _), _| *id != traversal_id);
    }

    /// Number of paths currently marked for extension, across all passes.
    pub fn pending_extensions(&self) -> usize {
        self.to_extend.iter().map(|marked| marked.len()).sum()
    }

    /// Stored entries ending at `node`, in insertion order.
    pub fn entries_ending_at(&self, node: NodeId) -> Vec<Arc<PathEntry>> {
        self.buckets
            .get(&node)
            .map(|bucket| bucket.entries.clone())
            .unwrap_or_default()
    }

    /// Stored paths ending at `node`, shortest first.
    pub fn paths_to(&self, node: NodeId) -> Vec<GraphPath> {
        let mut paths: Vec<GraphPath> = self
            .entries_ending_at(node)
            .iter()
            .map(|entry| entry.path.clone())
            .collect();
        paths.sort_by(|a, b| {
            a.len()
                .cmp(&b.len())
                .then_with(|| a.relationships().cmp(b.relationships()))
        });
        paths
    }

    /// Stored entries whose path uses `relationship`.
    pub fn entries_containing(&self, relationship: RelationshipId) -> Vec<Arc<PathEntry>> {
        self.by_relationship
            .get(&relationship)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Stored entries whose path passes through `node`.
    pub fn entries_through(&self, node: NodeId) -> Vec<Arc<PathEntry>> {
        self.by_node
            .get(&node)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Every stored entry.
    pub fn entries(&self) -> Vec<Arc<PathEntry>> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.entries.clone())
            .collect()
    }

    /// Nodes that at least one stored path ends on.
    pub fn reached_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.buckets.iter().map(|bucket| *bucket.key()).collect();
        nodes.sort();
        nodes
    }

    /// Number of stored paths.
    pub fn path_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.entries.len()).sum()
    }

    /// Registered cycles, in a stable order.
    pub fn cycles(&self) -> Vec<CyclePath> {
        self.cycles.lock().values().cloned().collect()
    }

    /// Whether a cycle with these members is registered.
    pub fn has_cycle(&self, key: &BTreeSet<RelationshipId>) -> bool {
        self.cycles.lock().contains_key(key)
    }

    /// Register `cycle` unless an equal one is already known. Returns
    /// whether it was added.
    pub fn register_cycle(&self, cycle: CyclePath) -> bool {
        let mut cycles = self.cycles.lock();
        let key = cycle.key();
        if cycles.contains_key(&key) {
            return false;
        }
        cycles.insert(key, cycle);
        true
    }

    /// Whether `node` takes part in a registered cycle.
    pub fn is_cycle_participant(&self, node: NodeId) -> bool {
        self.cycles.lock().values().any(|cycle| cycle.touches(node))
    }
}

impl std::fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCache")
            .field("view", &self.view.id())
            .field("paths", &self.path_count())
            .field("cycles", &self.cycles.lock().len())
            .finish_non_exhaustive()
    }
}

/// All view caches, keyed by view id.
#[derive(Debug, Default)]
pub struct PathCache {
    views: DashMap<ViewId, Arc<ViewCache>>,
}

impl PathCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache for `view`, created on first use.
    pub fn view(&self, view: &GraphView) -> Arc<ViewCache> {
        Arc::clone(
            &self
                .views
                .entry(view.id())
                .or_insert_with(|| Arc::new(ViewCache::new(view.clone()))),
        )
    }

    /// The cache for `view`, if it has been created.
    pub fn get(&self, view: &GraphView) -> Option<Arc<ViewCache>> {
        self.views.get(&view.id()).map(|cache| Arc::clone(&cache))
    }

    /// Every view cache.
    pub fn views(&self) -> Vec<Arc<ViewCache>> {
        self.views.iter().map(|cache| Arc::clone(&cache)).collect()
    }

    /// Drop the cache for `view`. Returns whether it existed.
    pub fn remove(&self, view: &GraphView) -> bool {
        self.views.remove(&view.id()).is_some()
    }
}
