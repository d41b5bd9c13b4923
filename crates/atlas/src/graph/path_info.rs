//! Per-path traversal state.

use super::filter::ProjectRelationshipFilter;
use super::mutator::{GraphMutator, Selections};
use super::path::GraphPath;
use crate::domain::ProjectRelationship;
use crate::error::Result;
use crate::storage::GraphStorage;
use std::fmt;
use std::sync::Arc;

/// The filter and mutator in force at the end of a path.
///
/// Derived one relationship at a time with [`GraphPathInfo::child`], which
/// only depends on the current info, the relationship and the stored graph.
/// A cached `(path, info)` pair therefore stays valid and can be extended
/// later without replaying the path from the root.
#[derive(Clone)]
pub struct GraphPathInfo {
    filter: Arc<dyn ProjectRelationshipFilter>,
    mutator: Arc<dyn GraphMutator>,
    pinned: Arc<Selections>,
}

impl GraphPathInfo {
    /// Info at a root. `pinned` are the view's explicit selections, which
    /// take precedence over anything the mutator decides.
    pub fn new(
        filter: Arc<dyn ProjectRelationshipFilter>,
        mutator: Arc<dyn GraphMutator>,
        pinned: Arc<Selections>,
    ) -> Self {
        Self {
            filter,
            mutator,
            pinned,
        }
    }

    /// Decide whether this path continues through `relationship`, and as
    /// what.
    ///
    /// Returns `None` when the filter rejects it. Otherwise returns the
    /// relationship to follow, with its target replaced by a pinned version
    /// or by the mutator's selection.
    pub fn select(&self, relationship: &ProjectRelationship) -> Option<ProjectRelationship> {
        if !self.filter.accept(relationship) {
            return None;
        }
        if let Some(pinned) = self.pinned.get(relationship.target().project()) {
            if pinned != relationship.target() {
                return Some(relationship.select_target(pinned.clone()));
            }
            return Some(relationship.clone());
        }
        Some(self.mutator.select_for(relationship))
    }

    /// Info for the path extended by `selected`, as returned from
    /// [`GraphPathInfo::select`].
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the mutator.
    pub fn child(&self, selected: &ProjectRelationship, storage: &dyn GraphStorage) -> Result<Self> {
        let filter = self
            .filter
            .child_filter(selected)
            .unwrap_or_else(|| Arc::clone(&self.filter));
        let mutator = self
            .mutator
            .mutator_for(selected, storage)?
            .unwrap_or_else(|| Arc::clone(&self.mutator));
        Ok(Self {
            filter,
            mutator,
            pinned: Arc::clone(&self.pinned),
        })
    }

    /// The filter in force.
    pub fn filter(&self) -> &Arc<dyn ProjectRelationshipFilter> {
        &self.filter
    }

    /// The mutator in force.
    pub fn mutator(&self) -> &Arc<dyn GraphMutator> {
        &self.mutator
    }

    /// Every selection in force: the mutator's, overridden by pinned ones.
    pub fn selections(&self) -> Selections {
        let mut all = self.mutator.selections();
        all.extend(
            self.pinned
                .iter()
                .map(|(project, version)| (project.clone(), version.clone())),
        );
        all
    }
}

impl fmt::Debug for GraphPathInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphPathInfo")
            .field("filter", &self.filter.long_id())
            .field("mutator", &self.mutator.long_id())
            .field("selections", &self.selections().len())
            .finish()
    }
}

/// A path together with the info in force at its end.
#[derive(Debug, Clone)]
pub struct PathEntry {
    /// The walk
    pub path: GraphPath,
    /// State at the end of the walk
    pub info: GraphPathInfo,
}

impl PathEntry {
    /// Pair a path with its info.
    pub fn new(path: GraphPath, info: GraphPathInfo) -> Self {
        Self { path, info }
    }
}
