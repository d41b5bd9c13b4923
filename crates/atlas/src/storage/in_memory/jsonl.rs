//! JSONL persistence for in-memory storage.
//!
//! Each line is one record, either a relationship or a named property blob:
//!
//! ```text
//! {"relationship":{"kind":"dependency","declaring":"g:a:1",...}}
//! {"property":{"key":"path-cache:0f3a...","value":"{...}"}}
//! ```
//!
//! Relationships are written in a deterministic order (declaring project,
//! then canonical edge order) so repeated saves of the same graph produce
//! identical files.

use super::InMemoryStorage;
use super::inner::InMemoryStorageInner;
use crate::domain::{ProjectRelationship, RelationshipId, canonical_order};
use crate::error::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// One line of a storage file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StorageRecord {
    Relationship(ProjectRelationship),
    Property { key: String, value: String },
}

/// Warnings that can occur during JSONL file loading.
///
/// These are non-fatal: the offending line is skipped and loading goes on.
/// Callers should surface them, since they point at a damaged or hand-edited
/// file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line that is not a valid record
    ///
    /// **Effect**: Line is skipped entirely.
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A relationship that parsed but failed validation
    ///
    /// **Effect**: The relationship is not stored.
    InvalidRelationship {
        /// 1-based line number
        line_number: usize,
        /// Validation message
        error: String,
    },

    /// A relationship structurally equal to an earlier line
    ///
    /// **Effect**: The later line is ignored; the first one wins.
    DuplicateRelationship {
        /// 1-based line number
        line_number: usize,
        /// Id of the duplicated relationship
        id: RelationshipId,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed record: {error}")
            }
            Self::InvalidRelationship { line_number, error } => {
                write!(f, "line {line_number}: invalid relationship: {error}")
            }
            Self::DuplicateRelationship { line_number, id } => {
                write!(f, "line {line_number}: duplicate relationship {id}")
            }
        }
    }
}

/// Load storage from a JSONL file.
///
/// Blank lines are ignored. Malformed or invalid lines become
/// [`LoadWarning`]s.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened or read.
pub fn load_from_jsonl(path: &Path) -> Result<(InMemoryStorage, Vec<LoadWarning>)> {
    let reader = BufReader::new(File::open(path)?);
    let mut inner = InMemoryStorageInner::new();
    let mut warnings = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<StorageRecord>(&line) {
            Ok(record) => record,
            Err(e) => {
                warnings.push(LoadWarning::MalformedJson {
                    line_number,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match record {
            StorageRecord::Relationship(rel) => {
                if let Err(e) = rel.validate() {
                    warnings.push(LoadWarning::InvalidRelationship {
                        line_number,
                        error: e.to_string(),
                    });
                    continue;
                }
                if inner.insert(&rel).is_none() {
                    warnings.push(LoadWarning::DuplicateRelationship {
                        line_number,
                        id: rel.id(),
                    });
                }
            }
            StorageRecord::Property { key, value } => {
                inner.properties.insert(key, value);
            }
        }
    }

    if !warnings.is_empty() {
        warn!(
            path = %path.display(),
            count = warnings.len(),
            "Skipped lines while loading storage"
        );
    }
    debug!(
        path = %path.display(),
        relationships = inner.relationships.len(),
        properties = inner.properties.len(),
        "Loaded storage"
    );

    Ok((
        InMemoryStorage {
            inner: RwLock::new(inner),
        },
        warnings,
    ))
}

/// Save storage to a JSONL file with atomic writes.
///
/// Writes to a temporary file next to `path` first, then renames it over
/// the target, so an interrupted save leaves the previous file intact.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Json` if writing fails.
pub fn save_to_jsonl(storage: &InMemoryStorage, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let records = {
        let inner = storage.inner.read();
        let mut rels: Vec<&ProjectRelationship> =
            inner.relationships.values().map(AsRef::as_ref).collect();
        rels.sort_by(|a, b| {
            a.declaring()
                .cmp(b.declaring())
                .then_with(|| canonical_order(a, b))
        });

        let mut lines = Vec::with_capacity(rels.len() + inner.properties.len());
        for rel in rels {
            lines.push(serde_json::to_string(&StorageRecord::Relationship(rel.clone()))?);
        }
        for (key, value) in &inner.properties {
            lines.push(serde_json::to_string(&StorageRecord::Property {
                key: key.clone(),
                value: value.clone(),
            })?);
        }
        lines
    };

    let mut writer = BufWriter::new(File::create(&temp_path)?);
    for line in &records {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    drop(writer);

    fs::rename(&temp_path, path)?;
    debug!(path = %path.display(), records = records.len(), "Saved storage");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactRef, DependencyScope, ProjectVersionRef};
    use crate::storage::GraphStorage;
    use tempfile::TempDir;

    fn pvr(s: &str) -> ProjectVersionRef {
        s.parse().unwrap()
    }

    fn dep(from: &str, to: &str) -> ProjectRelationship {
        ProjectRelationship::dependency(
            pvr(from),
            ArtifactRef::jar(pvr(to)),
            DependencyScope::Runtime,
            0,
            false,
        )
        .with_source("file:pom.xml")
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");

        let storage = InMemoryStorage::new();
        storage
            .add_relationships(&[dep("g:a:1", "g:b:1"), dep("g:b:1", "g:a:1")])
            .unwrap();
        storage.set_property("note", "hello".to_string()).unwrap();
        save_to_jsonl(&storage, &path).unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(loaded.relationship_count(), 2);
        assert_eq!(loaded.property("note").as_deref(), Some("hello"));

        let rel = loaded.relationship(dep("g:a:1", "g:b:1").id()).unwrap();
        assert_eq!(rel.scope(), Some(DependencyScope::Runtime));
        assert!(rel.sources().contains("file:pom.xml"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.jsonl");
        let second = dir.path().join("second.jsonl");

        let a = InMemoryStorage::new();
        a.add_relationships(&[dep("g:a:1", "g:b:1"), dep("g:c:1", "g:b:1")])
            .unwrap();
        let b = InMemoryStorage::new();
        b.add_relationships(&[dep("g:c:1", "g:b:1"), dep("g:a:1", "g:b:1")])
            .unwrap();

        save_to_jsonl(&a, &first).unwrap();
        save_to_jsonl(&b, &second).unwrap();
        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_bad_lines_become_warnings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.jsonl");
        let good = serde_json::to_string(&StorageRecord::Relationship(dep("g:a:1", "g:b:1")))
            .unwrap();
        let blank_source = good.replace("file:pom.xml", " ");
        fs::write(
            &path,
            format!("{good}\n\nnot json\n{good}\n{blank_source}\n"),
        )
        .unwrap();

        let (loaded, warnings) = load_from_jsonl(&path).unwrap();
        assert_eq!(loaded.relationship_count(), 1);
        assert_eq!(warnings.len(), 3);
        assert!(matches!(
            warnings[0],
            LoadWarning::MalformedJson { line_number: 3, .. }
        ));
        assert!(matches!(
            warnings[1],
            LoadWarning::DuplicateRelationship { line_number: 4, .. }
        ));
        assert!(matches!(
            warnings[2],
            LoadWarning::InvalidRelationship { line_number: 5, .. }
        ));
    }
}
