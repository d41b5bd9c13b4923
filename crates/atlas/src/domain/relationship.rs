//! Typed relationship edges between project versions.
//!
//! A relationship is an immutable value: a declaring project, a target
//! artifact, the declaration index within its kind, a managed flag, the
//! source URIs it was read from, plus whatever the kind adds (dependency
//! scope and excludes, plugin reporting flag, owning plugin).
//!
//! # Equality
//!
//! Equality is structural over the identity fields only: kind, declaring,
//! target and managed (plus the owning plugin for plugin dependencies).
//! Declaration index, scope and sources do not participate. The
//! [`RelationshipId`] is derived from the same fields, so equal
//! relationships always share an id.
//!
//! # Serialized form
//!
//! Relationships serialize as one JSON object tagged by `kind`, for example:
//!
//! ```json
//! {"kind":"dependency","declaring":"g:a:1","target":{"gav":"g:b:2","type":"jar"},
//!  "index":0,"managed":false,"sources":["file:pom.xml"],"scope":"compile"}
//! ```
//!
//! Sets are ordered, so the same relationship always serializes to the same
//! bytes.

use super::ids::RelationshipId;
use super::refs::{ArtifactRef, ProjectRef, ProjectVersionRef};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The kinds of relationship a project can declare.
///
/// Variant order is the canonical edge order used for traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    /// Inheritance from a parent POM
    Parent,

    /// Import of a bill-of-materials POM
    Bom,

    /// Declared dependency
    Dependency,

    /// Build plugin
    Plugin,

    /// Dependency of a build plugin
    PluginDependency,

    /// Build extension
    Extension,
}

impl RelationshipKind {
    /// All kinds, in canonical order.
    pub const ALL: [RelationshipKind; 6] = [
        Self::Parent,
        Self::Bom,
        Self::Dependency,
        Self::Plugin,
        Self::PluginDependency,
        Self::Extension,
    ];
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parent => "parent",
            Self::Bom => "bom",
            Self::Dependency => "dependency",
            Self::Plugin => "plugin",
            Self::PluginDependency => "plugin-dependency",
            Self::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// Maven dependency scope.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Default scope, available everywhere
    #[default]
    Compile,
    /// Supplied by the container at runtime
    Provided,
    /// Needed only when running
    Runtime,
    /// Needed only by tests
    Test,
    /// Supplied from a local path
    System,
    /// BOM import marker
    Import,
    /// Toolchain requirement
    Toolchain,
    /// Bundled inside the artifact
    Embedded,
}

impl DependencyScope {
    /// Whether a classpath of scope `self` includes dependencies of scope
    /// `other`.
    pub fn implies(self, other: DependencyScope) -> bool {
        use DependencyScope::{Compile, Embedded, Provided, Runtime, System, Test};
        if self == other {
            return true;
        }
        match self {
            Compile => matches!(other, Provided | System | Embedded),
            Runtime => matches!(other, Compile | Embedded),
            Test => matches!(other, Compile | Runtime | Provided | System | Embedded),
            _ => false,
        }
    }

    /// Whether dependencies of this scope are inherited transitively.
    pub fn is_transitive(self) -> bool {
        !matches!(self, Self::Provided | Self::Test | Self::System)
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Compile => "compile",
            Self::Provided => "provided",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::System => "system",
            Self::Import => "import",
            Self::Toolchain => "toolchain",
            Self::Embedded => "embedded",
        };
        f.write_str(name)
    }
}

/// Fields every relationship carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipCommon {
    /// The project whose POM declares this relationship
    pub declaring: ProjectVersionRef,

    /// The artifact the relationship points at
    pub target: ArtifactRef,

    /// Declaration order within its kind, used for tie-breaks
    pub index: u32,

    /// Whether this is a management entry rather than a concrete use
    #[serde(default)]
    pub managed: bool,

    /// URIs of the documents this relationship was read from
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub sources: BTreeSet<String>,
}

impl RelationshipCommon {
    /// Create the shared fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRelationship` if a source URI is blank.
    pub fn new(
        declaring: ProjectVersionRef,
        target: ArtifactRef,
        index: u32,
        managed: bool,
        sources: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let common = Self {
            declaring,
            target,
            index,
            managed,
            sources: sources.into_iter().collect(),
        };
        common.validate()?;
        Ok(common)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.iter().any(|s| s.trim().is_empty()) {
            return Err(Error::InvalidRelationship(format!(
                "{} -> {}: blank source URI",
                self.declaring, self.target
            )));
        }
        Ok(())
    }
}

/// `declaring` inherits from the parent `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentRelationship {
    /// Shared fields
    #[serde(flatten)]
    pub common: RelationshipCommon,
}

/// `declaring` imports the dependency management of BOM `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomRelationship {
    /// Shared fields
    #[serde(flatten)]
    pub common: RelationshipCommon,
}

/// `declaring` depends on `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyRelationship {
    /// Shared fields
    #[serde(flatten)]
    pub common: RelationshipCommon,

    /// Dependency scope
    #[serde(default)]
    pub scope: DependencyScope,

    /// Transitive exclusions (may contain wildcards)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excludes: BTreeSet<ProjectRef>,
}

/// `declaring` uses build plugin `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRelationship {
    /// Shared fields
    #[serde(flatten)]
    pub common: RelationshipCommon,

    /// Whether the plugin runs during site reporting
    #[serde(default)]
    pub reporting: bool,
}

/// Plugin `plugin`, used by `declaring`, depends on `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDependencyRelationship {
    /// Shared fields
    #[serde(flatten)]
    pub common: RelationshipCommon,

    /// The plugin this dependency belongs to
    pub plugin: ProjectRef,
}

/// `declaring` loads build extension `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionRelationship {
    /// Shared fields
    #[serde(flatten)]
    pub common: RelationshipCommon,
}

/// A typed relationship edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProjectRelationship {
    /// Parent POM inheritance
    Parent(ParentRelationship),
    /// BOM import
    Bom(BomRelationship),
    /// Dependency
    Dependency(DependencyRelationship),
    /// Build plugin
    Plugin(PluginRelationship),
    /// Plugin dependency
    PluginDependency(PluginDependencyRelationship),
    /// Build extension
    Extension(ExtensionRelationship),
}

impl ProjectRelationship {
    /// Parent relationship. Parents are always declaration index 0.
    pub fn parent(declaring: ProjectVersionRef, parent: ProjectVersionRef) -> Self {
        Self::Parent(ParentRelationship {
            common: RelationshipCommon {
                declaring,
                target: ArtifactRef::pom(parent),
                index: 0,
                managed: false,
                sources: BTreeSet::new(),
            },
        })
    }

    /// The relationship a top-level project declares to itself to mark the
    /// end of its parent chain.
    pub fn terminal_parent(project: ProjectVersionRef) -> Self {
        Self::parent(project.clone(), project)
    }

    /// BOM import relationship.
    pub fn bom(declaring: ProjectVersionRef, bom: ProjectVersionRef, index: u32) -> Self {
        Self::Bom(BomRelationship {
            common: RelationshipCommon {
                declaring,
                target: ArtifactRef::pom(bom),
                index,
                managed: true,
                sources: BTreeSet::new(),
            },
        })
    }

    /// Dependency relationship.
    pub fn dependency(
        declaring: ProjectVersionRef,
        target: ArtifactRef,
        scope: DependencyScope,
        index: u32,
        managed: bool,
    ) -> Self {
        Self::Dependency(DependencyRelationship {
            common: RelationshipCommon {
                declaring,
                target,
                index,
                managed,
                sources: BTreeSet::new(),
            },
            scope,
            excludes: BTreeSet::new(),
        })
    }

    /// Plugin relationship.
    pub fn plugin(
        declaring: ProjectVersionRef,
        plugin: ProjectVersionRef,
        index: u32,
        managed: bool,
        reporting: bool,
    ) -> Self {
        Self::Plugin(PluginRelationship {
            common: RelationshipCommon {
                declaring,
                target: ArtifactRef::new(plugin, Some("maven-plugin"), None, false),
                index,
                managed,
                sources: BTreeSet::new(),
            },
            reporting,
        })
    }

    /// Plugin-dependency relationship.
    pub fn plugin_dependency(
        declaring: ProjectVersionRef,
        plugin: ProjectRef,
        target: ArtifactRef,
        index: u32,
        managed: bool,
    ) -> Self {
        Self::PluginDependency(PluginDependencyRelationship {
            common: RelationshipCommon {
                declaring,
                target,
                index,
                managed,
                sources: BTreeSet::new(),
            },
            plugin,
        })
    }

    /// Build extension relationship.
    pub fn extension(declaring: ProjectVersionRef, extension: ProjectVersionRef, index: u32) -> Self {
        Self::Extension(ExtensionRelationship {
            common: RelationshipCommon {
                declaring,
                target: ArtifactRef::jar(extension),
                index,
                managed: false,
                sources: BTreeSet::new(),
            },
        })
    }

    /// Build from explicit common fields and a kind, with kind-specific
    /// fields at their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRelationship` for plugin dependencies, which
    /// need an owning plugin and must be built with
    /// [`ProjectRelationship::plugin_dependency`].
    pub fn from_common(kind: RelationshipKind, common: RelationshipCommon) -> Result<Self> {
        common.validate()?;
        Ok(match kind {
            RelationshipKind::Parent => Self::Parent(ParentRelationship { common }),
            RelationshipKind::Bom => Self::Bom(BomRelationship { common }),
            RelationshipKind::Dependency => Self::Dependency(DependencyRelationship {
                common,
                scope: DependencyScope::default(),
                excludes: BTreeSet::new(),
            }),
            RelationshipKind::Plugin => Self::Plugin(PluginRelationship {
                common,
                reporting: false,
            }),
            RelationshipKind::Extension => Self::Extension(ExtensionRelationship { common }),
            RelationshipKind::PluginDependency => {
                return Err(Error::InvalidRelationship(format!(
                    "{} -> {}: plugin dependency needs an owning plugin",
                    common.declaring, common.target
                )));
            }
        })
    }

    /// Re-check invariants of a relationship that bypassed the
    /// constructors (e.g. one that was deserialized).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRelationship` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        self.common().validate()?;
        if let Self::Parent(p) = self {
            if p.common.managed {
                return Err(Error::InvalidRelationship(format!(
                    "{}: parent relationships cannot be managed",
                    p.common.declaring
                )));
            }
        }
        Ok(())
    }

    /// The shared fields.
    pub fn common(&self) -> &RelationshipCommon {
        match self {
            Self::Parent(r) => &r.common,
            Self::Bom(r) => &r.common,
            Self::Dependency(r) => &r.common,
            Self::Plugin(r) => &r.common,
            Self::PluginDependency(r) => &r.common,
            Self::Extension(r) => &r.common,
        }
    }

    fn common_mut(&mut self) -> &mut RelationshipCommon {
        match self {
            Self::Parent(r) => &mut r.common,
            Self::Bom(r) => &mut r.common,
            Self::Dependency(r) => &mut r.common,
            Self::Plugin(r) => &mut r.common,
            Self::PluginDependency(r) => &mut r.common,
            Self::Extension(r) => &mut r.common,
        }
    }

    /// The relationship kind.
    pub fn kind(&self) -> RelationshipKind {
        match self {
            Self::Parent(_) => RelationshipKind::Parent,
            Self::Bom(_) => RelationshipKind::Bom,
            Self::Dependency(_) => RelationshipKind::Dependency,
            Self::Plugin(_) => RelationshipKind::Plugin,
            Self::PluginDependency(_) => RelationshipKind::PluginDependency,
            Self::Extension(_) => RelationshipKind::Extension,
        }
    }

    /// The declaring project.
    pub fn declaring(&self) -> &ProjectVersionRef {
        &self.common().declaring
    }

    /// The target project version.
    pub fn target(&self) -> &ProjectVersionRef {
        self.common().target.project_version()
    }

    /// The target artifact.
    pub fn target_artifact(&self) -> &ArtifactRef {
        &self.common().target
    }

    /// Declaration index within its kind.
    pub fn index(&self) -> u32 {
        self.common().index
    }

    /// Whether this is a management entry.
    pub fn is_managed(&self) -> bool {
        self.common().managed
    }

    /// Source URIs.
    pub fn sources(&self) -> &BTreeSet<String> {
        &self.common().sources
    }

    /// Dependency scope, for dependency relationships.
    pub fn scope(&self) -> Option<DependencyScope> {
        match self {
            Self::Dependency(d) => Some(d.scope),
            _ => None,
        }
    }

    /// Exclusions, for dependency relationships.
    pub fn excludes(&self) -> Option<&BTreeSet<ProjectRef>> {
        match self {
            Self::Dependency(d) => Some(&d.excludes),
            _ => None,
        }
    }

    /// Whether the relationship points back at its own declaring project.
    pub fn is_self_referential(&self) -> bool {
        self.declaring() == self.target()
    }

    /// Add a source URI.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.common_mut().sources.insert(source.into());
        self
    }

    /// Replace the exclusions of a dependency. Other kinds are unchanged.
    #[must_use]
    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = ProjectRef>) -> Self {
        if let Self::Dependency(d) = &mut self {
            d.excludes = excludes.into_iter().collect();
        }
        self
    }

    /// Copy of this relationship declared by `declaring` instead.
    ///
    /// Used when a child inherits relationships from a parent or ancestor.
    /// Every field other than the declaring reference is preserved.
    #[must_use]
    pub fn clone_for(&self, declaring: ProjectVersionRef) -> Self {
        match self {
            Self::Parent(r) => Self::Parent(ParentRelationship {
                common: RelationshipCommon {
                    declaring,
                    ..r.common.clone()
                },
            }),
            Self::Bom(r) => Self::Bom(BomRelationship {
                common: RelationshipCommon {
                    declaring,
                    ..r.common.clone()
                },
            }),
            Self::Dependency(r) => Self::Dependency(DependencyRelationship {
                common: RelationshipCommon {
                    declaring,
                    ..r.common.clone()
                },
                scope: r.scope,
                excludes: r.excludes.clone(),
            }),
            Self::Plugin(r) => Self::Plugin(PluginRelationship {
                common: RelationshipCommon {
                    declaring,
                    ..r.common.clone()
                },
                reporting: r.reporting,
            }),
            Self::PluginDependency(r) => Self::PluginDependency(PluginDependencyRelationship {
                common: RelationshipCommon {
                    declaring,
                    ..r.common.clone()
                },
                plugin: r.plugin.clone(),
            }),
            Self::Extension(r) => Self::Extension(ExtensionRelationship {
                common: RelationshipCommon {
                    declaring,
                    ..r.common.clone()
                },
            }),
        }
    }

    /// Copy of this relationship pointing at `target` instead, keeping the
    /// artifact type and classifier. No containment check is made; this is
    /// the forced rewrite used by version-selecting mutators.
    #[must_use]
    pub fn select_target(&self, target: ProjectVersionRef) -> Self {
        let mut selected = self.clone();
        let common = selected.common_mut();
        common.target = common.target.with_project_version(target);
        selected
    }

    /// The stable id of this relationship.
    pub fn id(&self) -> RelationshipId {
        RelationshipId::for_key(&self.identity_key())
    }

    fn identity_key(&self) -> String {
        let common = self.common();
        let mut key = format!(
            "{}|{}|{}|{}",
            self.kind(),
            common.declaring,
            common.target,
            common.managed
        );
        if let Self::PluginDependency(p) = self {
            key.push('|');
            key.push_str(&p.plugin.to_string());
        }
        key
    }
}

impl PartialEq for ProjectRelationship {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for ProjectRelationship {}

impl Hash for ProjectRelationship {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state);
    }
}

impl fmt::Display for ProjectRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -[{}{}]-> {}",
            self.declaring(),
            self.kind(),
            if self.is_managed() { ", managed" } else { "" },
            self.target_artifact()
        )
    }
}

/// Canonical edge order: by kind, then declaration index, then target.
pub fn canonical_order(a: &ProjectRelationship, b: &ProjectRelationship) -> Ordering {
    a.kind()
        .cmp(&b.kind())
        .then_with(|| a.index().cmp(&b.index()))
        .then_with(|| a.target_artifact().cmp(b.target_artifact()))
}
