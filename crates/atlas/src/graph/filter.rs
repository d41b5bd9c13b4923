//! Relationship filters.
//!
//! A filter decides whether traversal descends through a relationship, and
//! supplies the filter to use one level further down. Filters are immutable;
//! a filter that accumulates state (such as dependency exclusions) does so
//! by returning a new child filter.
//!
//! Every filter has a `long_id`, a stable string that fully describes it.
//! Views compare filters by `long_id`, so two filters with equal ids must
//! accept exactly the same relationships.

use crate::domain::{DependencyScope, ProjectRef, ProjectRelationship, RelationshipKind};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Decides which relationships a traversal follows.
pub trait ProjectRelationshipFilter: Send + Sync + fmt::Debug {
    /// Whether to descend through `relationship`.
    fn accept(&self, relationship: &ProjectRelationship) -> bool;

    /// The filter for relationships declared by `parent`'s target.
    ///
    /// `None` means "reuse this filter".
    fn child_filter(
        &self,
        parent: &ProjectRelationship,
    ) -> Option<Arc<dyn ProjectRelationshipFilter>> {
        let _ = parent;
        None
    }

    /// Stable identity string.
    fn long_id(&self) -> String;

    /// Whether managed relationships can be accepted.
    fn include_managed(&self) -> bool {
        false
    }

    /// Whether concrete (non-managed) relationships can be accepted.
    fn include_concrete(&self) -> bool {
        true
    }
}

fn managed_allowed(filter: &dyn ProjectRelationshipFilter, rel: &ProjectRelationship) -> bool {
    if rel.is_managed() {
        filter.include_managed()
    } else {
        filter.include_concrete()
    }
}

fn render_patterns(patterns: &BTreeSet<ProjectRef>) -> String {
    patterns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Accepts everything, managed or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyFilter;

impl ProjectRelationshipFilter for AnyFilter {
    fn accept(&self, _relationship: &ProjectRelationship) -> bool {
        true
    }

    fn long_id(&self) -> String {
        "any".to_string()
    }

    fn include_managed(&self) -> bool {
        true
    }
}

/// Accepts nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneFilter;

impl ProjectRelationshipFilter for NoneFilter {
    fn accept(&self, _relationship: &ProjectRelationship) -> bool {
        false
    }

    fn long_id(&self) -> String {
        "none".to_string()
    }

    fn include_concrete(&self) -> bool {
        false
    }
}

/// Accepts relationships of the listed kinds.
#[derive(Debug, Clone)]
pub struct KindFilter {
    kinds: BTreeSet<RelationshipKind>,
    managed: bool,
}

impl KindFilter {
    /// Accept `kinds`; managed relationships only if `managed`.
    pub fn new(kinds: impl IntoIterator<Item = RelationshipKind>, managed: bool) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            managed,
        }
    }

    /// Parent chain only.
    pub fn parents() -> Self {
        Self::new([RelationshipKind::Parent], false)
    }

    /// Build extensions, plus parents so inherited extensions are reached.
    pub fn extensions() -> Self {
        Self::new([RelationshipKind::Parent, RelationshipKind::Extension], false)
    }

    /// Everything needed to run the build itself: parents, BOMs, plugins,
    /// plugin dependencies and extensions.
    pub fn build_only() -> Self {
        Self::new(
            [
                RelationshipKind::Parent,
                RelationshipKind::Bom,
                RelationshipKind::Plugin,
                RelationshipKind::PluginDependency,
                RelationshipKind::Extension,
            ],
            false,
        )
    }
}

impl ProjectRelationshipFilter for KindFilter {
    fn accept(&self, relationship: &ProjectRelationship) -> bool {
        self.kinds.contains(&relationship.kind()) && managed_allowed(self, relationship)
    }

    fn long_id(&self) -> String {
        let kinds: Vec<String> = self.kinds.iter().map(ToString::to_string).collect();
        format!("kinds({}; managed={})", kinds.join(","), self.managed)
    }

    fn include_managed(&self) -> bool {
        self.managed
    }
}

/// Dependency relationships visible on a classpath of one scope.
///
/// Direct dependencies are accepted when the filter scope implies theirs.
/// Below the first level, Maven's transitivity rules apply: provided, test
/// and system dependencies and optional artifacts are not inherited, and the
/// excludes declared on every dependency walked so far are honoured.
#[derive(Debug, Clone)]
pub struct DependencyFilter {
    scope: DependencyScope,
    managed: bool,
    concrete: bool,
    excludes: BTreeSet<ProjectRef>,
    transitive: bool,
}

impl DependencyFilter {
    /// Concrete dependencies of `scope`.
    pub fn new(scope: DependencyScope) -> Self {
        Self {
            scope,
            managed: false,
            concrete: true,
            excludes: BTreeSet::new(),
            transitive: false,
        }
    }

    /// Also (or only) accept managed dependencies.
    #[must_use]
    pub fn with_managed(mut self, managed: bool, concrete: bool) -> Self {
        self.managed = managed;
        self.concrete = concrete;
        self
    }

    /// Start with these exclusion patterns.
    #[must_use]
    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = ProjectRef>) -> Self {
        self.excludes.extend(excludes);
        self
    }

    /// The scope this filter admits.
    pub fn scope(&self) -> DependencyScope {
        self.scope
    }

    fn is_excluded(&self, project: &ProjectRef) -> bool {
        self.excludes.iter().any(|pattern| pattern.matches(project))
    }
}

impl ProjectRelationshipFilter for DependencyFilter {
    fn accept(&self, relationship: &ProjectRelationship) -> bool {
        let ProjectRelationship::Dependency(dep) = relationship else {
            return false;
        };
        if !managed_allowed(self, relationship) || !self.scope.implies(dep.scope) {
            return false;
        }
        if self.is_excluded(relationship.target().project()) {
            return false;
        }
        if self.transitive
            && (!dep.scope.is_transitive() || relationship.target_artifact().is_optional())
        {
            return false;
        }
        true
    }

    fn child_filter(
        &self,
        parent: &ProjectRelationship,
    ) -> Option<Arc<dyn ProjectRelationshipFilter>> {
        let ProjectRelationship::Dependency(dep) = parent else {
            return None;
        };
        let adds_excludes = !dep.excludes.is_subset(&self.excludes);
        if self.transitive && !adds_excludes {
            return None;
        }
        let mut child = self.clone();
        child.transitive = true;
        child.excludes.extend(dep.excludes.iter().cloned());
        Some(Arc::new(child))
    }

    fn long_id(&self) -> String {
        format!(
            "dependency(scope={}; managed={}; concrete={}; transitive={}; excludes=[{}])",
            self.scope,
            self.managed,
            self.concrete,
            self.transitive,
            render_patterns(&self.excludes)
        )
    }

    fn include_managed(&self) -> bool {
        self.managed
    }

    fn include_concrete(&self) -> bool {
        self.concrete
    }
}

/// Wraps a filter and rejects targets matching any exclusion pattern.
#[derive(Debug, Clone)]
pub struct ExcludingFilter {
    inner: Arc<dyn ProjectRelationshipFilter>,
    excludes: BTreeSet<ProjectRef>,
}

impl ExcludingFilter {
    /// Reject targets matching `excludes` on top of `inner`.
    pub fn new(
        inner: Arc<dyn ProjectRelationshipFilter>,
        excludes: impl IntoIterator<Item = ProjectRef>,
    ) -> Self {
        Self {
            inner,
            excludes: excludes.into_iter().collect(),
        }
    }
}

impl ProjectRelationshipFilter for ExcludingFilter {
    fn accept(&self, relationship: &ProjectRelationship) -> bool {
        let target = relationship.target().project();
        self.inner.accept(relationship) && !self.excludes.iter().any(|p| p.matches(target))
    }

    fn child_filter(
        &self,
        parent: &ProjectRelationship,
    ) -> Option<Arc<dyn ProjectRelationshipFilter>> {
        self.inner.child_filter(parent).map(|inner| {
            Arc::new(Self {
                inner,
                excludes: self.excludes.clone(),
            }) as Arc<dyn ProjectRelationshipFilter>
        })
    }

    fn long_id(&self) -> String {
        format!(
            "excluding([{}]; {})",
            render_patterns(&self.excludes),
            self.inner.long_id()
        )
    }

    fn include_managed(&self) -> bool {
        self.inner.include_managed()
    }

    fn include_concrete(&self) -> bool {
        self.inner.include_concrete()
    }
}

fn compose_children(
    filters: &[Arc<dyn ProjectRelationshipFilter>],
    parent: &ProjectRelationship,
) -> Option<Vec<Arc<dyn ProjectRelationshipFilter>>> {
    let mut changed = false;
    let children = filters
        .iter()
        .map(|f| match f.child_filter(parent) {
            Some(child) => {
                changed = true;
                child
            }
            None => Arc::clone(f),
        })
        .collect();
    changed.then_some(children)
}

fn compose_ids(name: &str, filters: &[Arc<dyn ProjectRelationshipFilter>]) -> String {
    let ids: Vec<String> = filters.iter().map(|f| f.long_id()).collect();
    format!("{name}({})", ids.join(" | "))
}

/// Accepts what every member accepts.
#[derive(Debug, Clone)]
pub struct AndFilter {
    filters: Vec<Arc<dyn ProjectRelationshipFilter>>,
}

impl AndFilter {
    /// Conjunction of `filters`.
    pub fn new(filters: Vec<Arc<dyn ProjectRelationshipFilter>>) -> Self {
        Self { filters }
    }
}

impl ProjectRelationshipFilter for AndFilter {
    fn accept(&self, relationship: &ProjectRelationship) -> bool {
        self.filters.iter().all(|f| f.accept(relationship))
    }

    fn child_filter(
        &self,
        parent: &ProjectRelationship,
    ) -> Option<Arc<dyn ProjectRelationshipFilter>> {
        compose_children(&self.filters, parent)
            .map(|filters| Arc::new(Self { filters }) as Arc<dyn ProjectRelationshipFilter>)
    }

    fn long_id(&self) -> String {
        compose_ids("and", &self.filters)
    }

    fn include_managed(&self) -> bool {
        self.filters.iter().all(|f| f.include_managed())
    }

    fn include_concrete(&self) -> bool {
        self.filters.iter().all(|f| f.include_concrete())
    }
}

/// Accepts what any member accepts.
#[derive(Debug, Clone)]
pub struct OrFilter {
    filters: Vec<Arc<dyn ProjectRelationshipFilter>>,
}

impl OrFilter {
    /// Disjunction of `filters`.
    pub fn new(filters: Vec<Arc<dyn ProjectRelationshipFilter>>) -> Self {
        Self { filters }
    }
}

impl ProjectRelationshipFilter for OrFilter {
    fn accept(&self, relationship: &ProjectRelationship) -> bool {
        self.filters.iter().any(|f| f.accept(relationship))
    }

    fn child_filter(
        &self,
        parent: &ProjectRelationship,
    ) -> Option<Arc<dyn ProjectRelationshipFilter>> {
        compose_children(&self.filters, parent)
            .map(|filters| Arc::new(Self { filters }) as Arc<dyn ProjectRelationshipFilter>)
    }

    fn long_id(&self) -> String {
        compose_ids("or", &self.filters)
    }

    fn include_managed(&self) -> bool {
        self.filters.iter().any(|f| f.include_managed())
    }

    fn include_concrete(&self) -> bool {
        self.filters.iter().any(|f| f.include_concrete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactRef, ProjectVersionRef};
    use rstest::rstest;

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    fn dep_scoped(to: &str, scope: DependencyScope) -> ProjectRelationship {
        ProjectRelationship::dependency(pvr("g:app:1"), ArtifactRef::jar(pvr(to)), scope, 0, false)
    }

    #[rstest]
    #[case(DependencyScope::Runtime, DependencyScope::Compile, true)]
    #[case(DependencyScope::Runtime, DependencyScope::Runtime, true)]
    #[case(DependencyScope::Runtime, DependencyScope::Test, false)]
    #[case(DependencyScope::Compile, DependencyScope::Runtime, false)]
    fn test_dependency_filter_scope(
        #[case] filter_scope: DependencyScope,
        #[case] dep_scope: DependencyScope,
        #[case] accepted: bool,
    ) {
        let filter = DependencyFilter::new(filter_scope);
        assert_eq!(filter.accept(&dep_scoped("g:lib:1", dep_scope)), accepted);
    }

    #[test]
    fn test_dependency_filter_rejects_other_kinds_and_managed() {
        let filter = DependencyFilter::new(DependencyScope::Test);
        assert!(!filter.accept(&ProjectRelationship::parent(pvr("g:app:1"), pvr("g:p:1"))));
        let managed = ProjectRelationship::dependency(
            pvr("g:app:1"),
            ArtifactRef::jar(pvr("g:lib:1")),
            DependencyScope::Compile,
            0,
            true,
        );
        assert!(!filter.accept(&managed));
        assert!(
            DependencyFilter::new(DependencyScope::Test)
                .with_managed(true, true)
                .accept(&managed)
        );
    }

    #[test]
    fn test_child_filter_applies_transitivity_and_excludes() {
        let filter = DependencyFilter::new(DependencyScope::Test);
        let parent = dep_scoped("g:lib:1", DependencyScope::Compile)
            .with_excludes([ProjectRef::new("org.noise", "*").unwrap()]);

        // Direct test dependencies are fine
        assert!(filter.accept(&dep_scoped("g:junit:4", DependencyScope::Test)));

        let child = filter.child_filter(&parent).unwrap();
        assert!(!child.accept(&dep_scoped("g:junit:4", DependencyScope::Test)));
        assert!(!child.accept(&dep_scoped("org.noise:thing:1", DependencyScope::Compile)));
        assert!(child.accept(&dep_scoped("g:util:1", DependencyScope::Compile)));

        let optional = ProjectRelationship::dependency(
            pvr("g:lib:1"),
            ArtifactRef::new(pvr("g:opt:1"), None, None, true),
            DependencyScope::Compile,
            0,
            false,
        );
        assert!(filter.accept(&optional));
        assert!(!child.accept(&optional));

        // No new excludes below the first level: reuse
        let plain = dep_scoped("g:util:1", DependencyScope::Compile);
        assert!(child.child_filter(&plain).is_none());
        assert_ne!(child.long_id(), filter.long_id());
    }

    #[test]
    fn test_kind_filter_presets() {
        let parent = ProjectRelationship::parent(pvr("g:app:1"), pvr("g:p:1"));
        let dep = dep_scoped("g:lib:1", DependencyScope::Compile);
        let plugin = ProjectRelationship::plugin(pvr("g:app:1"), pvr("g:plug:1"), 0, false, false);

        assert!(KindFilter::parents().accept(&parent));
        assert!(!KindFilter::parents().accept(&dep));
        assert!(KindFilter::build_only().accept(&plugin));
        assert!(!KindFilter::build_only().accept(&dep));
    }

    #[test]
    fn test_composites() {
        let deps: Arc<dyn ProjectRelationshipFilter> =
            Arc::new(DependencyFilter::new(DependencyScope::Runtime));
        let parents: Arc<dyn ProjectRelationshipFilter> = Arc::new(KindFilter::parents());
        let either = OrFilter::new(vec![Arc::clone(&deps), Arc::clone(&parents)]);
        let both = AndFilter::new(vec![deps, parents]);

        let parent = ProjectRelationship::parent(pvr("g:app:1"), pvr("g:p:1"));
        let dep = dep_scoped("g:lib:1", DependencyScope::Compile);
        assert!(either.accept(&parent) && either.accept(&dep));
        assert!(!both.accept(&parent) && !both.accept(&dep));

        // Only the dependency member changes below a dependency
        let child = either.child_filter(&dep).unwrap();
        assert!(child.long_id().contains("transitive=true"));
        assert!(either.child_filter(&parent).is_none());
    }

    #[test]
    fn test_excluding_filter_wraps_children() {
        let inner: Arc<dyn ProjectRelationshipFilter> =
            Arc::new(DependencyFilter::new(DependencyScope::Runtime));
        let filter = ExcludingFilter::new(inner, [ProjectRef::new("g", "bad-*").unwrap()]);
        assert!(!filter.accept(&dep_scoped("g:bad-thing:1", DependencyScope::Compile)));

        let child = filter
            .child_filter(&dep_scoped("g:lib:1", DependencyScope::Compile))
            .unwrap();
        assert!(!child.accept(&dep_scoped("g:bad-other:1", DependencyScope::Compile)));
        assert!(child.long_id().starts_with("excluding("));
    }
}
