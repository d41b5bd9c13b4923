use crate::domain::{ArtifactRef, ProjectRef, ProjectRelationship, RelationshipKind};
use crate::graph::GraphPath;
use crate::traverse::{Traversal, TraversalType};
use std::collections::HashMap;

/// Resolves the transitive dependency artifact set, nearest first.
///
/// Runs breadth-first, so the first version of a project met is the one
/// nearest a root. Later versions of the same artifact lose and their
/// subtrees are not followed. Managed declarations are never followed.
#[derive(Debug, Default)]
pub struct TransitiveDependencyTraversal {
    artifacts: Vec<ArtifactRef>,
    chosen: HashMap<(ProjectRef, String, Option<String>), usize>,
}

impl TransitiveDependencyTraversal {
    /// An empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved artifacts in discovery order.
    pub fn artifacts(&self) -> &[ArtifactRef] {
        &self.artifacts
    }

    /// Take the resolved artifacts.
    pub fn into_artifacts(self) -> Vec<ArtifactRef> {
        self.artifacts
    }
}

impl Traversal for TransitiveDependencyTraversal {
    fn pre_check(&mut self, relationship: &ProjectRelationship, _path: &GraphPath) -> bool {
        relationship.kind() == RelationshipKind::Dependency && !relationship.is_managed()
    }

    fn traverse_edge(&mut self, relationship: &ProjectRelationship, _path: &GraphPath) -> bool {
        let artifact = relationship.target_artifact();
        let key = (
            artifact.project_version().project().clone(),
            artifact.artifact_type().to_string(),
            artifact.classifier().map(str::to_string),
        );
        match self.chosen.get(&key) {
            Some(&index) => self.artifacts[index].project_version() == artifact.project_version(),
            None => {
                self.chosen.insert(key, self.artifacts.len());
                self.artifacts.push(artifact.clone());
                true
            }
        }
    }

    fn traversal_type(&self, _pass: usize) -> TraversalType {
        TraversalType::BreadthFirst
    }
}
