//! Builder for the relationship set declared by one project.

use super::refs::{ArtifactRef, ProjectRef, ProjectVersionRef};
use super::relationship::{DependencyScope, ProjectRelationship, RelationshipKind};
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Accumulates the relationships one project declares.
///
/// Declaration indices are assigned per kind in insertion order. Plugin
/// dependencies must follow the plugin that owns them: adding one for a
/// plugin that was not added first is an error, as is building a set that
/// contains one.
#[derive(Debug)]
pub struct RelationshipSetBuilder {
    declaring: ProjectVersionRef,
    sources: BTreeSet<String>,
    relationships: Vec<ProjectRelationship>,
    next_index: HashMap<(RelationshipKind, bool), u32>,
    plugins: HashSet<(ProjectRef, bool)>,
}

impl RelationshipSetBuilder {
    /// Start a set for `declaring`.
    pub fn new(declaring: ProjectVersionRef) -> Self {
        Self {
            declaring,
            sources: BTreeSet::new(),
            relationships: Vec::new(),
            next_index: HashMap::new(),
            plugins: HashSet::new(),
        }
    }

    /// Source URI attached to every relationship built from here on.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.insert(source.into());
        self
    }

    fn next_index(&mut self, kind: RelationshipKind, managed: bool) -> u32 {
        let slot = self.next_index.entry((kind, managed)).or_insert(0);
        let index = *slot;
        *slot += 1;
        index
    }

    fn push(&mut self, rel: ProjectRelationship) {
        let rel = self
            .sources
            .iter()
            .fold(rel, |rel, source| rel.with_source(source.clone()));
        self.relationships.push(rel);
    }

    /// Declare the parent.
    #[must_use]
    pub fn parent(mut self, parent: ProjectVersionRef) -> Self {
        let rel = ProjectRelationship::parent(self.declaring.clone(), parent);
        self.push(rel);
        self
    }

    /// Declare a BOM import.
    #[must_use]
    pub fn bom(mut self, bom: ProjectVersionRef) -> Self {
        let index = self.next_index(RelationshipKind::Bom, true);
        let rel = ProjectRelationship::bom(self.declaring.clone(), bom, index);
        self.push(rel);
        self
    }

    /// Declare a dependency (or, with `managed`, a dependency-management
    /// entry).
    #[must_use]
    pub fn dependency(
        mut self,
        target: ArtifactRef,
        scope: DependencyScope,
        managed: bool,
        excludes: impl IntoIterator<Item = ProjectRef>,
    ) -> Self {
        let index = self.next_index(RelationshipKind::Dependency, managed);
        let rel =
            ProjectRelationship::dependency(self.declaring.clone(), target, scope, index, managed)
                .with_excludes(excludes);
        self.push(rel);
        self
    }

    /// Declare a build plugin.
    #[must_use]
    pub fn plugin(mut self, plugin: ProjectVersionRef, managed: bool, reporting: bool) -> Self {
        let index = self.next_index(RelationshipKind::Plugin, managed);
        self.plugins.insert((plugin.project().clone(), managed));
        let rel =
            ProjectRelationship::plugin(self.declaring.clone(), plugin, index, managed, reporting);
        self.push(rel);
        self
    }

    /// Declare a dependency of an already declared plugin.
    ///
    /// # Errors
    ///
    /// Returns `Error::OrphanedPluginDependency` if `plugin` has not been
    /// declared (with the same managed flag) on this builder.
    pub fn plugin_dependency(
        mut self,
        plugin: &ProjectRef,
        target: ArtifactRef,
        managed: bool,
    ) -> Result<Self> {
        if !self.plugins.contains(&(plugin.clone(), managed)) {
            return Err(Error::OrphanedPluginDependency {
                dependency: target.to_string(),
                plugin: plugin.to_string(),
            });
        }
        let index = self.next_index(RelationshipKind::PluginDependency, managed);
        let rel = ProjectRelationship::plugin_dependency(
            self.declaring.clone(),
            plugin.clone(),
            target,
            index,
            managed,
        );
        self.push(rel);
        Ok(self)
    }

    /// Declare a build extension.
    #[must_use]
    pub fn extension(mut self, extension: ProjectVersionRef) -> Self {
        let index = self.next_index(RelationshipKind::Extension, false);
        let rel = ProjectRelationship::extension(self.declaring.clone(), extension, index);
        self.push(rel);
        self
    }

    /// Add a prebuilt relationship, keeping its own index.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRelationship` if it is declared by a different
    /// project, or `Error::OrphanedPluginDependency` for a plugin dependency
    /// whose plugin has not been added.
    pub fn add(mut self, rel: ProjectRelationship) -> Result<Self> {
        rel.validate()?;
        if rel.declaring() != &self.declaring {
            return Err(Error::InvalidRelationship(format!(
                "{rel}: declared by {}, expected {}",
                rel.declaring(),
                self.declaring
            )));
        }
        match &rel {
            ProjectRelationship::Plugin(p) => {
                self.plugins
                    .insert((rel.target().project().clone(), p.common.managed));
            }
            ProjectRelationship::PluginDependency(pd) => {
                if !self.plugins.contains(&(pd.plugin.clone(), pd.common.managed)) {
                    return Err(Error::OrphanedPluginDependency {
                        dependency: rel.target_artifact().to_string(),
                        plugin: pd.plugin.to_string(),
                    });
                }
            }
            _ => {}
        }
        self.push(rel);
        Ok(self)
    }

    /// Build a set from relationships in declaration order.
    ///
    /// # Errors
    ///
    /// Fails as [`RelationshipSetBuilder::add`] does for the first bad entry.
    pub fn from_relationships(
        declaring: ProjectVersionRef,
        rels: impl IntoIterator<Item = ProjectRelationship>,
    ) -> Result<Vec<ProjectRelationship>> {
        rels.into_iter()
            .try_fold(Self::new(declaring), Self::add)
            .map(Self::build)
    }

    /// The accumulated relationships, duplicates (by structural equality)
    /// removed, first declaration kept.
    pub fn build(self) -> Vec<ProjectRelationship> {
        let mut seen = HashSet::new();
        self.relationships
            .into_iter()
            .filter(|rel| seen.insert(rel.id()))
            .collect()
    }
}
