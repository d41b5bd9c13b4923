//! Atlas - Maven project relationship graphs.
//!
//! Stores typed relationships between project versions (parents, BOM
//! imports, dependencies, plugins, plugin dependencies and extensions) and
//! answers questions about them through views. A [`graph::GraphView`] fixes
//! the roots, which relationships are followed, and how versions are
//! selected along the way. Every path walked under a view is cached, so
//! cycle and path queries stay cheap, and inserting relationships extends
//! existing view caches instead of invalidating them.
//!
//! ```no_run
//! use atlas::RelationshipGraph;
//! use atlas::domain::{ArtifactRef, DependencyScope, ProjectRelationship, ProjectVersionRef};
//! use atlas::graph::GraphView;
//!
//! # fn main() -> atlas::Result<()> {
//! let graph = RelationshipGraph::in_memory();
//! let app: ProjectVersionRef = "org.acme:app:1.0".parse()?;
//! let util: ProjectVersionRef = "org.acme:util:2.1".parse()?;
//! graph.add_relationships(&[ProjectRelationship::dependency(
//!     app.clone(),
//!     ArtifactRef::jar(util.clone()),
//!     DependencyScope::Compile,
//!     0,
//!     false,
//! )])?;
//!
//! let view = GraphView::new("default", [app]);
//! assert_eq!(graph.paths_to(&view, &util)?.len(), 1);
//! assert!(graph.cycles(&view)?.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod cache;
pub mod domain;
pub mod error;
pub mod graph;
pub mod relationship_graph;
pub mod storage;
pub mod traverse;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

pub mod app;
pub mod config;
pub mod output;

pub use error::{Error, Result};
pub use relationship_graph::RelationshipGraph;
