//! In-memory storage backend using petgraph.
//!
//! All data lives in RAM and is lost when the process exits unless it is
//! written out with [`save_to_jsonl`] and read back with [`load_from_jsonl`].
//!
//! # Architecture
//!
//! - `StableDiGraph<ProjectVersionRef, RelationshipId>` holds the structure.
//!   Stable indices keep `NodeIndex`/`EdgeIndex` valid across insertions.
//! - `HashMap<NodeId, NodeIndex>` maps stable node ids to graph nodes.
//! - `HashMap<RelationshipId, Arc<ProjectRelationship>>` resolves edge ids
//!   to the relationship values, shared without copying.
//! - A sorted map of named property blobs (persisted path caches).
//!
//! Edge direction follows the relationship: declaring -> target.
//!
//! # Thread Safety
//!
//! The inner state sits behind a `parking_lot::RwLock`. Lookups take the
//! read lock, so concurrent traversals never block each other; insertions
//! and property writes take the write lock.
//!
//! # Performance Characteristics
//!
//! - Insert: O(1) amortized per relationship
//! - Relationship lookup: O(1)
//! - Outgoing/incoming: O(d log d) where d is the node degree (sorted)
//! - Cycle check: O(n + e) (`has_path_connecting`)

mod graph;
mod inner;
mod jsonl;
mod trait_impl;

use inner::InMemoryStorageInner;
use parking_lot::RwLock;

pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Thread-safe in-memory graph storage.
///
/// Implements [`GraphStorage`](crate::storage::GraphStorage) in
/// `trait_impl.rs`.
pub struct InMemoryStorage {
    inner: RwLock<InMemoryStorageInner>,
}

impl InMemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(InMemoryStorageInner::new()),
        }
    }

    /// Number of stored project nodes.
    pub fn node_count(&self) -> usize {
        self.inner.read().graph.node_count()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("InMemoryStorage")
            .field("nodes", &inner.graph.node_count())
            .field("relationships", &inner.relationships.len())
            .field("properties", &inner.properties.len())
            .finish()
    }
}
