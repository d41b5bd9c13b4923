//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or JSON. Text output is
//! colored unless `NO_COLOR` is set or `ATLAS_COLOR` is `0`/`false`.

use crate::domain::{ProjectRelationship, RelationshipKind};
use crate::traverse::TraversalSummary;
use colored::Colorize;
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::sync::Arc;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Text styling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output
    pub use_colors: bool,
}

impl OutputConfig {
    /// Read settings from the environment.
    ///
    /// Reads `NO_COLOR` (any value disables colors) and `ATLAS_COLOR`
    /// (`0` or `false` disables colors).
    pub fn from_env() -> Self {
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("ATLAS_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);
        Self { use_colors }
    }

    /// Plain output, no styling.
    pub fn plain() -> Self {
        Self { use_colors: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Apply semantic "success" color (green) to text.
pub fn success(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.green().to_string()
}

/// Apply semantic "warning" color (yellow) to text.
pub fn warning(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.yellow().to_string()
}

/// Apply semantic "error" color (red) to text.
pub fn error(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.red().bold().to_string()
}

fn cyan(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

fn colorize_kind(kind: RelationshipKind, config: &OutputConfig) -> String {
    let text = kind.to_string();
    if !config.use_colors {
        return text;
    }
    match kind {
        RelationshipKind::Parent => text.magenta().to_string(),
        RelationshipKind::Bom => text.blue().to_string(),
        RelationshipKind::Dependency => text.white().to_string(),
        RelationshipKind::Plugin | RelationshipKind::PluginDependency => text.yellow().to_string(),
        RelationshipKind::Extension => text.cyan().to_string(),
    }
}

/// Print any serializable value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an IO error if serialization or the write fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(io::Error::other)?;
    writeln!(handle)
}

/// One relationship on one line.
pub fn format_relationship(rel: &ProjectRelationship, config: &OutputConfig) -> String {
    let mut line = format!(
        "{} {} {}",
        cyan(&rel.declaring().to_string(), config),
        colorize_kind(rel.kind(), config),
        rel.target_artifact()
    );
    if let Some(scope) = rel.scope() {
        line.push_str(&dimmed(&format!(" ({scope})"), config));
    }
    if rel.is_managed() {
        line.push_str(&dimmed(" [managed]", config));
    }
    line
}

/// Write relationships, one per line.
///
/// # Errors
///
/// Returns an IO error if the write fails.
pub fn write_relationships<W: Write>(
    w: &mut W,
    relationships: &[ProjectRelationship],
    config: &OutputConfig,
) -> io::Result<()> {
    if relationships.is_empty() {
        return writeln!(w, "{}", dimmed("No relationships.", config));
    }
    for rel in relationships {
        writeln!(w, "  {}", format_relationship(rel, config))?;
    }
    writeln!(w)?;
    writeln!(w, "{} relationship(s)", relationships.len())
}

/// Write numbered walks, each as its chain of relationships.
///
/// `label` names one walk, e.g. "Cycle" or "Path".
///
/// # Errors
///
/// Returns an IO error if the write fails.
pub fn write_walks<W: Write>(
    w: &mut W,
    label: &str,
    walks: &[Vec<Arc<ProjectRelationship>>],
    config: &OutputConfig,
) -> io::Result<()> {
    for (i, walk) in walks.iter().enumerate() {
        writeln!(w, "  {} {}:", warning(label, config), i + 1)?;
        if walk.is_empty() {
            writeln!(w, "    {}", dimmed("(root)", config))?;
        }
        for rel in walk {
            writeln!(w, "    {}", format_relationship(rel, config))?;
        }
    }
    Ok(())
}

/// Write a one-line traversal summary.
///
/// # Errors
///
/// Returns an IO error if the write fails.
pub fn write_summary<W: Write>(w: &mut W, summary: &TraversalSummary, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{}",
        dimmed(
            &format!(
                "view {}: {} edge(s) followed, {} new path(s), {} new cycle(s)",
                summary.view, summary.edges, summary.new_paths, summary.new_cycles
            ),
            config
        )
    )
}
