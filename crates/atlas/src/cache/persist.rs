//! Saving and restoring view caches through storage properties.
//!
//! A view cache is stored as one JSON blob under the property
//! `path-cache:<view id>`. Paths are kept as root plus relationship ids
//! rather than as raw node lists: restoring replays each path through the
//! view, so a path whose relationships are gone, or that the view would now
//! walk differently, is dropped instead of coming back stale.
//!
//! Each blob records how many relationships storage held when it was
//! written. A blob written against a different relationship count is
//! ignored on restore: the cache may be missing paths through edges
//! inserted since, so the view is walked again instead.

use super::{CacheOutcome, ViewCache};
use crate::domain::{ProjectVersionRef, RelationshipId};
use crate::error::{Error, Result};
use crate::graph::{CyclePath, GraphView, PathEntry, Selections};
use crate::storage::GraphStorage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Property key prefix for persisted view caches.
pub const PROPERTY_PREFIX: &str = "path-cache:";

#[derive(Debug, Serialize, Deserialize)]
struct PersistedCache {
    view: String,
    #[serde(default)]
    relationship_count: Option<usize>,
    paths: Vec<PersistedPath>,
    #[serde(default)]
    cycles: Vec<CyclePath>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedPath {
    root: ProjectVersionRef,
    relationships: Vec<RelationshipId>,
    #[serde(default, skip_serializing_if = "Selections::is_empty")]
    selections: Selections,
}

/// What a restore brought back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Paths replayed into the cache
    pub paths: usize,
    /// Paths that no longer replay and were dropped
    pub dropped: usize,
    /// Cycles registered
    pub cycles: usize,
}

/// The property key holding `view`'s cache.
pub fn property_key(view: &GraphView) -> String {
    format!("{PROPERTY_PREFIX}{}", view.id())
}

/// Write `cache` to storage. Returns the number of paths written.
///
/// # Errors
///
/// Returns an error if serialization or the property write fails.
pub fn persist(cache: &ViewCache, storage: &dyn GraphStorage) -> Result<usize> {
    let view = cache.view();
    let mut paths = Vec::new();
    for entry in cache.entries() {
        let Some(root) = view
            .roots()
            .iter()
            .find(|root| root.node_id() == entry.path.origin())
        else {
            warn!(path = %entry.path, "Cached path does not start at a view root, skipping");
            continue;
        };
        paths.push(PersistedPath {
            root: root.clone(),
            relationships: entry.path.relationships().to_vec(),
            selections: entry.info.selections(),
        });
    }
    paths.sort_by(|a, b| {
        a.relationships
            .len()
            .cmp(&b.relationships.len())
            .then_with(|| a.root.cmp(&b.root))
            .then_with(|| a.relationships.cmp(&b.relationships))
    });

    let count = paths.len();
    let blob = PersistedCache {
        view: view.long_id().to_string(),
        relationship_count: Some(storage.relationship_count()),
        paths,
        cycles: cache.cycles(),
    };
    storage.set_property(&property_key(view), serde_json::to_string(&blob)?)?;
    info!(view = %view.id(), paths = count, "Persisted path cache");
    Ok(count)
}

/// Load `cache`'s view from storage into `cache`.
///
/// Returns `Ok(None)` when nothing is persisted for the view, or what is
/// persisted was written against a different set of relationships.
///
/// # Errors
///
/// Returns `Error::Json` for a corrupt blob, and `Error::Storage` when the
/// blob belongs to a different view.
pub fn restore(cache: &ViewCache, storage: &dyn GraphStorage) -> Result<Option<RestoreReport>> {
    let view = cache.view();
    let Some(raw) = storage.property(&property_key(view)) else {
        return Ok(None);
    };
    let blob: PersistedCache = serde_json::from_str(&raw)?;
    if blob.view != view.long_id() {
        return Err(Error::Storage(format!(
            "persisted cache for '{}' does not match view '{}'",
            blob.view,
            view.long_id()
        )));
    }
    let current = storage.relationship_count();
    if blob.relationship_count != Some(current) {
        info!(
            view = %view.id(),
            persisted = ?blob.relationship_count,
            current,
            "Persisted path cache is stale, ignoring"
        );
        return Ok(None);
    }

    let mut report = RestoreReport::default();
    for persisted in &blob.paths {
        match replay(view, persisted, storage) {
            Ok(Some(entry)) => {
                if entry.info.selections() != persisted.selections {
                    warn!(path = %entry.path, "Selections changed since persist, dropping path");
                    report.dropped += 1;
                    continue;
                }
                match cache.cache_path(entry, storage) {
                    CacheOutcome::Cached(_) | CacheOutcome::Duplicate => report.paths += 1,
                    CacheOutcome::Cycle(_) => report.dropped += 1,
                }
            }
            Ok(None) => report.dropped += 1,
            Err(e) => {
                warn!(root = %persisted.root, error = %e, "Persisted path no longer resolves, dropping");
                report.dropped += 1;
            }
        }
    }

    for cycle in blob.cycles {
        if !cycle.is_well_formed() {
            warn!("Skipping malformed persisted cycle");
            continue;
        }
        if cache.register_cycle(cycle) {
            report.cycles += 1;
        }
    }

    info!(
        view = %view.id(),
        paths = report.paths,
        dropped = report.dropped,
        cycles = report.cycles,
        "Restored path cache"
    );
    Ok(Some(report))
}

/// Walk a persisted path through the view. `Ok(None)` when the view no
/// longer walks it the same way.
fn replay(
    view: &GraphView,
    persisted: &PersistedPath,
    storage: &dyn GraphStorage,
) -> Result<Option<PathEntry>> {
    if !view.is_root(&persisted.root) {
        debug!(root = %persisted.root, "Persisted root is not a view root");
        return Ok(None);
    }
    let mut current = view.root_entry(&persisted.root, storage)?;
    for &id in &persisted.relationships {
        let rel = storage.relationship(id)?;
        if rel.declaring().node_id() != current.path.terminal() {
            return Ok(None);
        }
        let Some(selected) = current.info.select(&rel) else {
            return Ok(None);
        };
        let path = current.path.append(id, selected.target().node_id());
        let info = current.info.child(&selected, storage)?;
        current = PathEntry::new(path, info);
    }
    Ok(Some(current))
}
