//! Graph mutators: version selection during traversal.
//!
//! A mutator may rewrite the target of a relationship before traversal
//! follows it, and may hand out a derived mutator for the next level. The
//! chain of derived mutators along a path carries the version selections
//! accumulated from the root down.
//!
//! # First selection wins
//!
//! [`ManagedDependencyMutator`] gives Maven's dependency-management
//! semantics. Walking a dependency picks up the managed versions declared by
//! its target, but a version already selected higher up the path is never
//! replaced. Whatever is declared nearest the root wins, with no explicit
//! bookkeeping: the chain itself encodes it.

use crate::domain::{
    DependencyScope, ProjectRef, ProjectRelationship, ProjectVersionRef, RelationshipKind,
};
use crate::error::Result;
use crate::storage::GraphStorage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Version selections keyed by versionless project.
pub type Selections = BTreeMap<ProjectRef, ProjectVersionRef>;

/// Rewrites relationship targets as traversal proceeds.
pub trait GraphMutator: Send + Sync + fmt::Debug {
    /// The relationship to follow in place of `relationship`.
    ///
    /// Must be a pure function of this mutator's selections and the input.
    fn select_for(&self, relationship: &ProjectRelationship) -> ProjectRelationship;

    /// The mutator for relationships declared by `relationship`'s target.
    ///
    /// `Ok(None)` means "reuse this mutator": nothing new was learned.
    fn mutator_for(
        &self,
        relationship: &ProjectRelationship,
        storage: &dyn GraphStorage,
    ) -> Result<Option<Arc<dyn GraphMutator>>>;

    /// The mutator to start from at `root`. Defaults to reusing this one.
    fn mutator_for_root(
        &self,
        root: &ProjectVersionRef,
        storage: &dyn GraphStorage,
    ) -> Result<Option<Arc<dyn GraphMutator>>> {
        let _ = (root, storage);
        Ok(None)
    }

    /// The selections this mutator applies.
    fn selections(&self) -> Selections;

    /// Stable identity string, used for view equality. For a view's own
    /// mutator this covers how it was configured; what derived mutators
    /// accumulate along a path is path state and never reaches a view.
    fn long_id(&self) -> String;
}

/// Leaves every relationship as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpGraphMutator;

impl GraphMutator for NoOpGraphMutator {
    fn select_for(&self, relationship: &ProjectRelationship) -> ProjectRelationship {
        relationship.clone()
    }

    fn mutator_for(
        &self,
        _relationship: &ProjectRelationship,
        _storage: &dyn GraphStorage,
    ) -> Result<Option<Arc<dyn GraphMutator>>> {
        Ok(None)
    }

    fn selections(&self) -> Selections {
        Selections::new()
    }

    fn long_id(&self) -> String {
        "no-op".to_string()
    }
}

/// Applies managed dependency versions, nearest declaration first.
#[derive(Debug, Clone, Default)]
pub struct ManagedDependencyMutator {
    selections: Arc<Selections>,
}

impl ManagedDependencyMutator {
    /// A mutator with no selections yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mutator starting from `selections`.
    pub fn with_selections(selections: Selections) -> Self {
        Self {
            selections: Arc::new(selections),
        }
    }

    /// Merge the managed dependencies declared by `project` under the
    /// current selections. Returns `None` when nothing new turned up.
    fn accumulate(
        &self,
        project: &ProjectVersionRef,
        storage: &dyn GraphStorage,
    ) -> Result<Option<Arc<dyn GraphMutator>>> {
        let mut merged: Option<Selections> = None;
        for rel in storage.outgoing(project.node_id())? {
            if !is_managed_version_source(&rel) {
                continue;
            }
            let target = rel.target();
            if self.selections.contains_key(target.project()) {
                continue;
            }
            let next = merged.get_or_insert_with(|| (*self.selections).clone());
            // The first declaration at this level wins too
            next.entry(target.project().clone())
                .or_insert_with(|| target.clone());
        }
        Ok(merged.map(|selections| Arc::new(Self::with_selections(selections)) as Arc<dyn GraphMutator>))
    }
}

/// Direct managed dependencies, not BOM imports. BOM imports are expanded
/// separately and are skipped here one level deep.
fn is_managed_version_source(rel: &ProjectRelationship) -> bool {
    rel.kind() == RelationshipKind::Dependency
        && rel.is_managed()
        && rel.scope() != Some(DependencyScope::Import)
}

impl GraphMutator for ManagedDependencyMutator {
    fn select_for(&self, relationship: &ProjectRelationship) -> ProjectRelationship {
        if relationship.kind() != RelationshipKind::Dependency || relationship.is_managed() {
            return relationship.clone();
        }
        match self.selections.get(relationship.target().project()) {
            Some(selected) if selected != relationship.target() => {
                relationship.select_target(selected.clone())
            }
            _ => relationship.clone(),
        }
    }

    fn mutator_for(
        &self,
        relationship: &ProjectRelationship,
        storage: &dyn GraphStorage,
    ) -> Result<Option<Arc<dyn GraphMutator>>> {
        if relationship.kind() != RelationshipKind::Dependency || relationship.is_managed() {
            return Ok(None);
        }
        self.accumulate(relationship.target(), storage)
    }

    fn mutator_for_root(
        &self,
        root: &ProjectVersionRef,
        storage: &dyn GraphStorage,
    ) -> Result<Option<Arc<dyn GraphMutator>>> {
        self.accumulate(root, storage)
    }

    fn selections(&self) -> Selections {
        (*self.selections).clone()
    }

    fn long_id(&self) -> String {
        if self.selections.is_empty() {
            return "managed-dependency".to_string();
        }
        let seeded: Vec<String> = self.selections.values().map(ToString::to_string).collect();
        format!("managed-dependency[{}]", seeded.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactRef;
    use crate::storage::in_memory::InMemoryStorage;
    use proptest::prelude::*;

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    fn dep(from: &str, to: &str, managed: bool) -> ProjectRelationship {
        ProjectRelationship::dependency(
            pvr(from),
            ArtifactRef::jar(pvr(to)),
            DependencyScope::Compile,
            0,
            managed,
        )
    }

    #[test]
    fn test_noop_passes_through() {
        let rel = dep("g:a:1", "g:b:1", false);
        assert_eq!(NoOpGraphMutator.select_for(&rel), rel);
        assert!(NoOpGraphMutator.selections().is_empty());
    }

    #[test]
    fn test_select_rewrites_only_concrete_dependencies() {
        let mut selections = Selections::new();
        selections.insert(ProjectRef::new("g", "b").unwrap(), pvr("g:b:2"));
        let mutator = ManagedDependencyMutator::with_selections(selections);

        let concrete = mutator.select_for(&dep("g:a:1", "g:b:1", false));
        assert_eq!(concrete.target(), &pvr("g:b:2"));

        let managed = mutator.select_for(&dep("g:a:1", "g:b:1", true));
        assert_eq!(managed.target(), &pvr("g:b:1"));

        let parent = ProjectRelationship::parent(pvr("g:a:1"), pvr("g:b:1"));
        assert_eq!(mutator.select_for(&parent).target(), &pvr("g:b:1"));
    }

    #[test]
    fn test_existing_selection_wins() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[
                dep("g:mid:1", "g:x:2", true),
                dep("g:mid:1", "g:y:1", true),
            ])
            .unwrap();

        let mut selections = Selections::new();
        selections.insert(ProjectRef::new("g", "x").unwrap(), pvr("g:x:1"));
        let mutator = ManagedDependencyMutator::with_selections(selections);

        let child = mutator
            .mutator_for(&dep("g:root:1", "g:mid:1", false), &storage)
            .unwrap()
            .unwrap();
        let chosen = child.selections();
        assert_eq!(chosen[&ProjectRef::new("g", "x").unwrap()], pvr("g:x:1"));
        assert_eq!(chosen[&ProjectRef::new("g", "y").unwrap()], pvr("g:y:1"));
        // The parent mutator is untouched
        assert_eq!(mutator.selections().len(), 1);
    }

    #[test]
    fn test_nothing_new_reuses_mutator() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[dep("g:mid:1", "g:x:2", true)])
            .unwrap();
        let mut selections = Selections::new();
        selections.insert(ProjectRef::new("g", "x").unwrap(), pvr("g:x:1"));
        let mutator = ManagedDependencyMutator::with_selections(selections);

        assert!(
            mutator
                .mutator_for(&dep("g:root:1", "g:mid:1", false), &storage)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_bom_imports_are_not_version_sources() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[
                ProjectRelationship::dependency(
                    pvr("g:mid:1"),
                    ArtifactRef::pom(pvr("g:platform:3")),
                    DependencyScope::Import,
                    0,
                    true,
                ),
                ProjectRelationship::bom(pvr("g:mid:1"), pvr("g:other-bom:1"), 0),
            ])
            .unwrap();
        let mutator = ManagedDependencyMutator::new();
        assert!(
            mutator
                .mutator_for(&dep("g:root:1", "g:mid:1", false), &storage)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_managed_pom_dependency_is_version_source() {
        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[ProjectRelationship::dependency(
                pvr("g:mid:1"),
                ArtifactRef::pom(pvr("g:aggregate:4")),
                DependencyScope::Compile,
                0,
                true,
            )])
            .unwrap();

        let child = ManagedDependencyMutator::new()
            .mutator_for(&dep("g:root:1", "g:mid:1", false), &storage)
            .unwrap()
            .unwrap();
        let rewritten = child.select_for(&dep("g:mid:1", "g:aggregate:1", false));
        assert_eq!(rewritten.target(), &pvr("g:aggregate:4"));
    }

    #[test]
    fn test_long_id_covers_seeded_selections() {
        let mut selections = Selections::new();
        selections.insert(ProjectRef::new("g", "lib").unwrap(), pvr("g:lib:9"));
        let seeded = ManagedDependencyMutator::with_selections(selections);
        let plain = ManagedDependencyMutator::new();

        assert_eq!(plain.long_id(), "managed-dependency");
        assert_eq!(seeded.long_id(), "managed-dependency[g:lib:9]");
        assert_ne!(seeded.long_id(), NoOpGraphMutator.long_id());
    }

    /// Managed declarations for a chain of projects `g:p0:1 -> g:p1:1 -> ..`,
    /// as `(library index, version)` pairs per level.
    fn managed_chain() -> impl Strategy<Value = Vec<Vec<(u8, u8)>>> {
        proptest::collection::vec(proptest::collection::vec((0u8..4, 1u8..5), 0..4), 1..6)
    }

    proptest! {
        /// A selection, once made, survives every derived mutator.
        #[test]
        fn prop_selections_never_change_once_made(levels in managed_chain()) {
            let storage = InMemoryStorage::new();
            let project = |level: usize| pvr(&format!("g:p{level}:1"));
            for (level, managed) in levels.iter().enumerate() {
                let rels: Vec<ProjectRelationship> = managed
                    .iter()
                    .map(|(lib, version)| {
                        dep(&project(level).to_string(), &format!("g:lib{lib}:{version}"), true)
                    })
                    .collect();
                storage.add_relationships(&rels).unwrap();
            }

            let start: Arc<dyn GraphMutator> = Arc::new(ManagedDependencyMutator::new());
            let mut mutator = start
                .mutator_for_root(&project(0), &storage)
                .unwrap()
                .unwrap_or(start);
            for level in 1..levels.len() {
                let before = mutator.selections();
                let edge = dep(&project(level - 1).to_string(), &project(level).to_string(), false);
                if let Some(next) = mutator.mutator_for(&edge, &storage).unwrap() {
                    mutator = next;
                }
                let after = mutator.selections();
                for (key, chosen) in &before {
                    prop_assert_eq!(after.get(key), Some(chosen));
                }
                // Everything declared so far is selected
                for (lib, _) in &levels[level] {
                    let key = ProjectRef::new("g", format!("lib{lib}")).unwrap();
                    prop_assert!(after.contains_key(&key));
                }
            }
        }
    }
}
