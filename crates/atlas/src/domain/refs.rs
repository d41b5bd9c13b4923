//! Project, project-version and artifact references.
//!
//! Canonical string forms:
//!
//! - `ProjectRef`: `groupId:artifactId`
//! - `ProjectVersionRef`: `groupId:artifactId:version`
//! - `ArtifactRef`: `groupId:artifactId:version[:type[:classifier]]`
//!
//! The version spec of a `ProjectVersionRef` is parsed once, at
//! construction, and kept next to the version string. Equality and hashing
//! use the string, which is the single source both are derived from.

use super::version::{SingleVersion, VersionSpec};
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Default artifact type when none is given.
pub const DEFAULT_TYPE: &str = "jar";

fn invalid(input: &str, reason: &str) -> Error {
    Error::InvalidRef {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn require_field(input: &str, name: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(input, &format!("{name} must not be empty")));
    }
    Ok(value.to_string())
}

/// Glob match where `*` stands for any (possibly empty) run of characters.
fn glob_matches(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = value;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            let Some(stripped) = rest.strip_prefix(part) else {
                return false;
            };
            rest = stripped;
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            let Some(pos) = rest.find(part) else {
                return false;
            };
            rest = &rest[pos + part.len()..];
        }
    }
    true
}

/// A `groupId:artifactId` pair, without a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectRef {
    group_id: String,
    artifact_id: String,
}

impl ProjectRef {
    /// Create a project reference.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRef` if either field is empty.
    pub fn new(group_id: impl AsRef<str>, artifact_id: impl AsRef<str>) -> Result<Self> {
        let (g, a) = (group_id.as_ref(), artifact_id.as_ref());
        let input = format!("{g}:{a}");
        Ok(Self {
            group_id: require_field(&input, "groupId", g)?,
            artifact_id: require_field(&input, "artifactId", a)?,
        })
    }

    /// The groupId.
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// The artifactId.
    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Whether this reference contains a `*` wildcard in either field.
    pub fn is_pattern(&self) -> bool {
        self.group_id.contains('*') || self.artifact_id.contains('*')
    }

    /// Treat `self` as a pattern and test `other` against it.
    pub fn matches(&self, other: &ProjectRef) -> bool {
        glob_matches(&self.group_id, &other.group_id)
            && glob_matches(&self.artifact_id, &other.artifact_id)
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for ProjectRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [g, a] => Self::new(g, a),
            _ => Err(invalid(s, "expected groupId:artifactId")),
        }
    }
}

/// A project at a particular version (or version range).
#[derive(Debug, Clone)]
pub struct ProjectVersionRef {
    project: ProjectRef,
    version: String,
    spec: VersionSpec,
}

impl ProjectVersionRef {
    /// Create a versioned reference, parsing the version spec.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRef` if any field is empty or the version
    /// cannot be parsed.
    pub fn new(
        group_id: impl AsRef<str>,
        artifact_id: impl AsRef<str>,
        version: impl AsRef<str>,
    ) -> Result<Self> {
        let project = ProjectRef::new(group_id, artifact_id)?;
        Self::with_project(project, version)
    }

    /// Attach a version to an existing project reference.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRef` if the version cannot be parsed.
    pub fn with_project(project: ProjectRef, version: impl AsRef<str>) -> Result<Self> {
        let raw = version.as_ref();
        let version = require_field(&format!("{project}:{raw}"), "version", raw)?;
        let spec = version.parse()?;
        Ok(Self {
            project,
            version,
            spec,
        })
    }

    /// Build from an already parsed spec. The version string is rendered
    /// from the spec so the two stay mutually derivable.
    pub fn from_spec(project: ProjectRef, spec: VersionSpec) -> Self {
        Self {
            project,
            version: spec.to_string(),
            spec,
        }
    }

    /// The versionless project reference.
    pub fn project(&self) -> &ProjectRef {
        &self.project
    }

    /// The groupId.
    pub fn group_id(&self) -> &str {
        self.project.group_id()
    }

    /// The artifactId.
    pub fn artifact_id(&self) -> &str {
        self.project.artifact_id()
    }

    /// The version string as declared.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The parsed version spec.
    pub fn version_spec(&self) -> &VersionSpec {
        &self.spec
    }

    /// Whether the version names exactly one concrete version.
    pub fn is_specific(&self) -> bool {
        self.spec.is_single()
    }

    /// Narrow this reference to a concrete version inside its spec.
    ///
    /// # Errors
    ///
    /// Returns `Error::VersionNotInSpec` when `version` is not contained in
    /// the current spec. Callers check containment first.
    pub fn select_version(&self, version: &SingleVersion) -> Result<Self> {
        if !self.spec.contains(version) {
            return Err(Error::VersionNotInSpec {
                version: version.to_string(),
                spec: self.version.clone(),
            });
        }
        Ok(Self::from_spec(
            self.project.clone(),
            VersionSpec::Single(version.clone()),
        ))
    }
}

impl PartialEq for ProjectVersionRef {
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project && self.version == other.version
    }
}

impl Eq for ProjectVersionRef {}

impl Hash for ProjectVersionRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project.hash(state);
        self.version.hash(state);
    }
}

impl PartialOrd for ProjectVersionRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProjectVersionRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.project
            .cmp(&other.project)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl fmt::Display for ProjectVersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.version)
    }
}

impl FromStr for ProjectVersionRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [g, a, v] => Self::new(g, a, v),
            _ => Err(invalid(s, "expected groupId:artifactId:version")),
        }
    }
}

impl Serialize for ProjectVersionRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProjectVersionRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for ProjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProjectRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A concrete artifact produced by a project version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// The producing project version
    #[serde(rename = "gav")]
    project_version: ProjectVersionRef,

    /// Artifact type (packaging extension), `jar` by default
    #[serde(rename = "type", default = "default_type")]
    artifact_type: String,

    /// Optional classifier, never the empty string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    classifier: Option<String>,

    /// Whether the artifact is an optional dependency
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    optional: bool,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl ArtifactRef {
    /// Create an artifact reference. An empty type becomes `jar`, an empty
    /// classifier becomes `None`.
    pub fn new(
        project_version: ProjectVersionRef,
        artifact_type: Option<&str>,
        classifier: Option<&str>,
        optional: bool,
    ) -> Self {
        let artifact_type = artifact_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TYPE)
            .to_string();
        let classifier = classifier
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Self {
            project_version,
            artifact_type,
            classifier,
            optional,
        }
    }

    /// The main `jar` artifact of a project version.
    pub fn jar(project_version: ProjectVersionRef) -> Self {
        Self::new(project_version, None, None, false)
    }

    /// The `pom` artifact of a project version.
    pub fn pom(project_version: ProjectVersionRef) -> Self {
        Self::new(project_version, Some("pom"), None, false)
    }

    /// The producing project version.
    pub fn project_version(&self) -> &ProjectVersionRef {
        &self.project_version
    }

    /// The artifact type.
    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// The classifier, if any.
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// Whether this is an optional artifact.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Same artifact, produced by a different project version.
    pub fn with_project_version(&self, project_version: ProjectVersionRef) -> Self {
        Self {
            project_version,
            ..self.clone()
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.project_version)?;
        if self.artifact_type != DEFAULT_TYPE || self.classifier.is_some() {
            write!(f, ":{}", self.artifact_type)?;
        }
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        Ok(())
    }
}

impl FromStr for ArtifactRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [g, a, v] => Ok(Self::jar(ProjectVersionRef::new(g, a, v)?)),
            [g, a, v, t] => Ok(Self::new(ProjectVersionRef::new(g, a, v)?, Some(t), None, false)),
            [g, a, v, t, c] => Ok(Self::new(
                ProjectVersionRef::new(g, a, v)?,
                Some(t),
                Some(c),
                false,
            )),
            _ => Err(invalid(s, "expected groupId:artifactId:version[:type[:classifier]]")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_project_version_ref() {
        let pvr: ProjectVersionRef = "org.foo:bar:1.0".parse().unwrap();
        assert_eq!(pvr.group_id(), "org.foo");
        assert_eq!(pvr.artifact_id(), "bar");
        assert_eq!(pvr.version(), "1.0");
        assert!(pvr.is_specific());
        assert_eq!(pvr.to_string(), "org.foo:bar:1.0");
    }

    #[rstest]
    #[case("org.foo:bar")]
    #[case(":bar:1.0")]
    #[case("org.foo::1.0")]
    #[case("org.foo:bar:")]
    #[case("a:b:c:d:e:f")]
    fn test_invalid_refs_rejected(#[case] input: &str) {
        assert!(input.parse::<ProjectVersionRef>().is_err());
    }

    #[test]
    fn test_artifact_defaults() {
        let art: ArtifactRef = "org.foo:bar:1.0".parse().unwrap();
        assert_eq!(art.artifact_type(), "jar");
        assert_eq!(art.classifier(), None);

        let pvr = ProjectVersionRef::new("org.foo", "bar", "1.0").unwrap();
        let art = ArtifactRef::new(pvr, Some(""), Some(""), false);
        assert_eq!(art.artifact_type(), "jar");
        assert_eq!(art.classifier(), None);
        assert_eq!(art.to_string(), "org.foo:bar:1.0");
    }

    #[test]
    fn test_artifact_display_includes_classifier() {
        let art: ArtifactRef = "org.foo:bar:1.0:jar:sources".parse().unwrap();
        assert_eq!(art.to_string(), "org.foo:bar:1.0:jar:sources");
        let pom: ArtifactRef = "org.foo:bar:1.0:pom".parse().unwrap();
        assert_eq!(pom.to_string(), "org.foo:bar:1.0:pom");
    }

    #[rstest]
    #[case("org.*", "bar", "org.foo", "bar", true)]
    #[case("*", "*", "any.group", "thing", true)]
    #[case("org.foo", "bar-*", "org.foo", "bar-core", true)]
    #[case("org.foo", "*-core", "org.foo", "bar-api", false)]
    #[case("org.foo", "bar", "org.foo", "baz", false)]
    fn test_wildcard_matching(
        #[case] pg: &str,
        #[case] pa: &str,
        #[case] g: &str,
        #[case] a: &str,
        #[case] expected: bool,
    ) {
        let pattern = ProjectRef::new(pg, pa).unwrap();
        let candidate = ProjectRef::new(g, a).unwrap();
        assert_eq!(pattern.matches(&candidate), expected);
    }

    #[test]
    fn test_select_version_inside_range() {
        let pvr = ProjectVersionRef::new("org.foo", "bar", "[1.0,2.0)").unwrap();
        let chosen = pvr
            .select_version(&SingleVersion::parse("1.5").unwrap())
            .unwrap();
        assert_eq!(chosen.version(), "1.5");
        assert!(chosen.is_specific());
    }

    #[test]
    fn test_select_version_outside_range_fails() {
        let pvr = ProjectVersionRef::new("org.foo", "bar", "[1.0,2.0)").unwrap();
        let err = pvr
            .select_version(&SingleVersion::parse("2.0").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::VersionNotInSpec { .. }));
    }

    #[test]
    fn test_serde_uses_canonical_strings() {
        let art = ArtifactRef::new(
            "org.foo:bar:1.0".parse().unwrap(),
            Some("test-jar"),
            None,
            true,
        );
        let json = serde_json::to_string(&art).unwrap();
        assert_eq!(
            json,
            r#"{"gav":"org.foo:bar:1.0","type":"test-jar","optional":true}"#
        );
        let back: ArtifactRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, art);
    }
}
