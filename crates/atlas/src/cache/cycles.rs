//! Cycle acceptance for a view.
//!
//! A path that lands back on a node it already visited closes a cycle. Not
//! every such cycle belongs to the view: the closing edge was reached
//! through one particular path, and the rest of the loop may only be
//! walkable under different filter or version-selection state. Before a
//! cycle is registered, the detector checks that the view can actually walk
//! it, starting from some path already cached in this view.

use super::ViewCache;
use crate::domain::{NodeId, RelationshipId};
use crate::error::{Error, Result};
use crate::graph::{CyclePath, PathEntry};
use crate::storage::GraphStorage;
use tracing::{debug, trace, warn};

/// Decides whether a detected cycle is registered with a view cache.
pub struct CycleDetector<'a> {
    cache: &'a ViewCache,
    storage: &'a dyn GraphStorage,
}

impl<'a> CycleDetector<'a> {
    /// A detector for `cache`, resolving edges through `storage`.
    pub fn new(cache: &'a ViewCache, storage: &'a dyn GraphStorage) -> Self {
        Self { cache, storage }
    }

    /// Handle a cycle closed by `injector`, the edge that landed back on a
    /// visited node.
    ///
    /// Returns the registered cycle, rotated so its entry point is where
    /// the view enters it. Returns `None` when the cycle is degenerate,
    /// already registered, or cannot be walked within the view.
    pub fn cycle_detected(&self, cycle: CyclePath, injector: RelationshipId) -> Option<CyclePath> {
        if cycle.is_degenerate() {
            debug!(relationship = %injector, "Discarding zero-length cycle");
            return None;
        }
        if self.cache.has_cycle(&cycle.key()) {
            trace!(relationship = %injector, "Cycle already registered");
            return None;
        }

        let Some(accepted) = self.contained_in_view(&cycle, injector) else {
            debug!(
                view = %self.cache.view().id(),
                members = cycle.len(),
                "Cycle is not walkable within the view"
            );
            return None;
        };

        if self.cache.register_cycle(accepted.clone()) {
            debug!(
                view = %self.cache.view().id(),
                entry_point = %accepted.entry_point(),
                members = accepted.len(),
                "Registered cycle"
            );
            Some(accepted)
        } else {
            None
        }
    }

    /// Try each member other than the injector as an entry point. The first
    /// one that some cached path can walk around to the injector wins.
    fn contained_in_view(&self, cycle: &CyclePath, injector: RelationshipId) -> Option<CyclePath> {
        for (index, &member) in cycle.relationships().iter().enumerate() {
            if member == injector {
                continue;
            }
            match self.walkable_from(cycle, index, injector) {
                Ok(true) => return Some(cycle.rotated(index)),
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, entry = %member, "Cycle reconstruction aborted");
                }
            }
        }
        None
    }

    /// Whether a cached path ending at the departure node of member `index`
    /// can walk the members from there up to, not including, the injector.
    fn walkable_from(&self, cycle: &CyclePath, index: usize, injector: RelationshipId) -> Result<bool> {
        let members = cycle.relationships();
        let nodes = cycle.nodes();
        let count = members.len();

        let mut walk = Vec::with_capacity(count);
        for step in 0..count {
            let i = (index + step) % count;
            if members[i] == injector {
                break;
            }
            walk.push((members[i], nodes[(i + 1) % count]));
        }

        for entry in self.cache.entries_ending_at(nodes[index]) {
            if self.replays(&entry, &walk)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn replays(&self, entry: &PathEntry, walk: &[(RelationshipId, NodeId)]) -> Result<bool> {
        let mut info = entry.info.clone();
        for &(id, expected) in walk {
            let rel = self
                .storage
                .relationship(id)
                .map_err(|_| Error::CycleLookup { relationship: id })?;
            let Some(selected) = info.select(&rel) else {
                return Ok(false);
            };
            if selected.target().node_id() != expected {
                return Ok(false);
            }
            info = info.child(&selected, self.storage)?;
        }
        Ok(true)
    }
}
