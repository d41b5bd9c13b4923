//! Graph traversal.
//!
//! A [`Traversal`] is a visitor: it gets told when a pass starts and ends,
//! is asked before and after each edge whether to follow it, and is
//! notified of cycles. The [`GraphTraverser`] drives it over a
//! [`GraphView`](crate::graph::GraphView), feeding every path it walks into
//! that view's path cache.
//!
//! # Per-edge protocol
//!
//! For each outgoing relationship of the node at the end of the current
//! path, in canonical order:
//!
//! 1. The view's filter and version selection decide what to follow.
//! 2. [`Traversal::pre_check`] on the relationship as stored. `false` skips it.
//! 3. Edges already followed in this pass are skipped, unless the extended
//!    path closes a cycle.
//! 4. [`Traversal::traverse_edge`] on the selected relationship and the
//!    extended path. `false` skips it.
//! 5. The extended path is offered to the cache. A path closing a cycle
//!    triggers [`Traversal::cycle_detected`] the first time that cycle is
//!    registered, and is never descended into.
//!
//! Resuming a view after new relationships are inserted splices each one
//! onto the cached paths ending at its declaring node, with the same
//! protocol applied to every spliced step.

mod engine;
mod seen;
pub mod traversals;

pub use engine::{GraphTraverser, TraversalSummary};
pub use seen::SeenTracker;

use crate::domain::ProjectRelationship;
use crate::graph::{CyclePath, GraphPath, GraphView};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order in which a pass visits edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalType {
    /// Follow each edge to the bottom before the next sibling
    #[default]
    DepthFirst,
    /// Visit all edges at one depth before going deeper
    BreadthFirst,
}

impl fmt::Display for TraversalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthFirst => write!(f, "depth-first"),
            Self::BreadthFirst => write!(f, "breadth-first"),
        }
    }
}

/// Lifecycle of a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalState {
    /// Not started
    NotStarted,
    /// In progress
    Running,
    /// Finished normally
    Completed,
    /// Stopped by an error
    Aborted,
}

/// Visitor driven by [`GraphTraverser`].
///
/// Every hook except [`Traversal::traverse_edge`] has a default, so a
/// visitor only implements what it cares about.
pub trait Traversal {
    /// Called once at the start of each pass.
    fn start_traverse(&mut self, pass: usize, view: &GraphView) {
        let _ = (pass, view);
    }

    /// Called once when a pass completes normally.
    fn end_traverse(&mut self, pass: usize, view: &GraphView) {
        let _ = (pass, view);
    }

    /// Cheap early rejection of the relationship as stored. `path` is the
    /// path the relationship would extend.
    fn pre_check(&mut self, relationship: &ProjectRelationship, path: &GraphPath) -> bool {
        let _ = (relationship, path);
        true
    }

    /// Called with the relationship as selected by the view and the path
    /// it extends to. Returning `false` stops descent along this edge.
    fn traverse_edge(&mut self, relationship: &ProjectRelationship, path: &GraphPath) -> bool;

    /// A cycle was registered. `relationship` is the edge that closed it.
    fn cycle_detected(&mut self, cycle: &CyclePath, relationship: &ProjectRelationship) {
        let _ = (cycle, relationship);
    }

    /// How many passes to run.
    fn required_passes(&self) -> usize {
        1
    }

    /// Edge order for pass `pass`.
    fn traversal_type(&self, pass: usize) -> TraversalType {
        let _ = pass;
        TraversalType::DepthFirst
    }
}

/// A traversal that follows everything and records nothing. Used to warm
/// or extend a view's cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheWarming;

impl Traversal for CacheWarming {
    fn traverse_edge(&mut self, _relationship: &ProjectRelationship, _path: &GraphPath) -> bool {
        true
    }
}
