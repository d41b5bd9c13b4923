//! Error types for atlas operations.
//!
//! Errors fall into two groups:
//!
//! - **Construction errors** (`InvalidRelationship`, `InvalidRef`,
//!   `OrphanedPluginDependency`, `VersionNotInSpec`) fail fast when a value
//!   is built from bad input. They are never silently coerced.
//! - **Lookup and infrastructure errors** (`RelationshipNotFound`,
//!   `CycleLookup`, `Storage`, `Io`, ...) come from the storage layer.
//!
//! Duplicate path or cycle registration is not an error. Once caches
//! stabilise it is the normal steady state, handled with set membership.

use crate::domain::{ProjectVersionRef, RelationshipId};
use std::io;
use thiserror::Error;

/// The error type for atlas operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A relationship was constructed with missing or malformed fields.
    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// A project/artifact coordinate string could not be parsed.
    #[error("Invalid reference '{input}': {reason}")]
    InvalidRef {
        /// The rejected input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// A plugin dependency was supplied before its owning plugin.
    #[error("Plugin dependency {dependency} references undeclared plugin {plugin}")]
    OrphanedPluginDependency {
        /// The plugin-dependency target
        dependency: String,
        /// The plugin it claims to belong to
        plugin: String,
    },

    /// A version selection outside the target's version spec.
    #[error("Version {version} is not contained in spec {spec}")]
    VersionNotInSpec {
        /// The version that was requested
        version: String,
        /// The spec it had to fall inside
        spec: String,
    },

    /// A relationship id is not present in storage.
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),

    /// A project node is not present in storage.
    #[error("Project not found: {0}")]
    NodeNotFound(ProjectVersionRef),

    /// Cycle reconstruction referenced an edge that no longer resolves.
    ///
    /// Aborts only the reconstruction that hit it, never the traversal pass.
    #[error("Cycle reconstruction failed at relationship {relationship}")]
    CycleLookup {
        /// The member edge that could not be resolved
        relationship: RelationshipId,
    },

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for atlas operations.
pub type Result<T> = std::result::Result<T, Error>;
