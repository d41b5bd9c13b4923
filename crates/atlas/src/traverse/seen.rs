//! Per-pass record of followed edges.

use crate::domain::{RelationshipId, ViewId};
use dashmap::DashMap;
use std::collections::HashSet;

/// Which relationships each running pass has already followed.
///
/// Keyed by view and pass id, so concurrent passes, over the same view or
/// not, never see each other's marks. A pass clears its entry when it
/// finishes.
#[derive(Debug, Default)]
pub struct SeenTracker {
    seen: DashMap<(ViewId, u64), HashSet<RelationshipId>>,
}

impl SeenTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether pass `traversal` over `view` has followed `relationship`.
    pub fn has_seen(&self, view: ViewId, traversal: u64, relationship: RelationshipId) -> bool {
        self.seen
            .get(&(view, traversal))
            .is_some_and(|seen| seen.contains(&relationship))
    }

    /// Record `relationship` as followed. Returns `false` if it already was.
    pub fn mark(&self, view: ViewId, traversal: u64, relationship: RelationshipId) -> bool {
        self.seen
            .entry((view, traversal))
            .or_default()
            .insert(relationship)
    }

    /// Forget everything pass `traversal` over `view` followed.
    pub fn clear(&self, view: ViewId, traversal: u64) {
        self.seen.remove(&(view, traversal));
    }

    /// Number of passes with live marks.
    pub fn active_passes(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_per_pass() {
        let tracker = SeenTracker::new();
        let view = ViewId::from_raw(1);
        let rel = RelationshipId::from_raw(9);

        assert!(tracker.mark(view, 1, rel));
        assert!(!tracker.mark(view, 1, rel));
        assert!(tracker.has_seen(view, 1, rel));
        assert!(!tracker.has_seen(view, 2, rel));
        assert!(!tracker.has_seen(ViewId::from_raw(2), 1, rel));

        tracker.clear(view, 1);
        assert!(!tracker.has_seen(view, 1, rel));
        assert_eq!(tracker.active_passes(), 0);
    }
}
