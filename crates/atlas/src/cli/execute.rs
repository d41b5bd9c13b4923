//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::{Context, Result};
use serde_json::json;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::args::{
    AddArgs, AncestryArgs, BuildOrderArgs, CheckCycleArgs, CyclesArgs, InitArgs, PathsArgs,
    ResolveArgs, TraverseArgs,
};
use crate::app::App;
use crate::domain::ProjectRelationship;
use crate::graph::GraphView;
use crate::output::{self, OutputConfig, OutputMode};
use crate::traverse::traversals::{
    AncestryTraversal, BuildOrderTraversal, FilteringTraversal, TransitiveDependencyTraversal,
};

/// Execute the init command
pub fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!(
            "Initializing atlas workspace{}...",
            args.workspace
                .as_ref()
                .map(|w| format!(" '{w}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(&current_dir, args.workspace.as_deref())?;

    if !args.quiet {
        println!("Initialized atlas in {}", result.atlas_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Data:   {}", result.data_file.display());
        println!("  Workspace: {}", result.workspace);
    }

    Ok(())
}

/// Execute the add command
pub fn execute_add(app: &App, args: &AddArgs, output_mode: OutputMode) -> Result<()> {
    let file = std::fs::File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    let mut relationships = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rel: ProjectRelationship = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: not a relationship", args.file.display(), index + 1))?;
        relationships.push(rel);
    }

    let added = app.graph().add_relationships(&relationships)?;
    app.save()?;
    info!(read = relationships.len(), added = added.len(), "Added relationships");

    let present = relationships.len() - added.len();
    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "read": relationships.len(),
            "added": added,
            "already_present": present,
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            println!(
                "{} {} relationship(s) ({} already present)",
                output::success("Added", &config),
                added.len(),
                present
            );
        }
    }
    Ok(())
}

/// Load the view's persisted cache when the configuration keeps one.
///
/// A blob that cannot be restored is logged and ignored; the view is walked
/// from scratch instead.
fn restore_if_configured(app: &App, view: &GraphView) {
    if !app.config().cache.persist {
        return;
    }
    match app.graph().restore_cache(view) {
        Ok(Some(report)) => debug!(view = %view.id(), paths = report.paths, "Restored path cache"),
        Ok(None) => debug!(view = %view.id(), "No usable persisted path cache"),
        Err(e) => warn!(view = %view.id(), error = %e, "Ignoring persisted path cache"),
    }
}

/// Write the view's cache back when the configuration keeps one.
fn persist_if_configured(app: &App, view: &GraphView) -> Result<()> {
    if app.persist_if_configured(view)? {
        app.save()?;
    }
    Ok(())
}

/// Execute the traverse command
pub fn execute_traverse(app: &App, args: &TraverseArgs, output_mode: OutputMode) -> Result<()> {
    let view = args.view.to_view(&app.config().workspace);
    restore_if_configured(app, &view);

    let order = args
        .order
        .map_or(app.config().traversal.default_type, Into::into);
    let mut traversal = FilteringTraversal::new().with_traversal_type(order);
    let summary = app.graph().traverse(&view, &mut traversal)?;
    persist_if_configured(app, &view)?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "view": view.long_id(),
            "summary": summary,
            "relationships": traversal.relationships(),
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let mut stdout = io::stdout().lock();
            output::write_relationships(&mut stdout, traversal.relationships(), &config)?;
            output::write_summary(&mut stdout, &summary, &config)?;
        }
    }
    Ok(())
}

/// Execute the cycles command
pub fn execute_cycles(app: &App, args: &CyclesArgs, output_mode: OutputMode) -> Result<()> {
    let view = args.view.to_view(&app.config().workspace);
    restore_if_configured(app, &view);

    let cycles = app.graph().cycles(&view)?;
    let walks = cycles
        .iter()
        .map(|cycle| app.graph().resolve(cycle.relationships()))
        .collect::<crate::error::Result<Vec<_>>>()?;
    persist_if_configured(app, &view)?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "view": view.long_id(),
            "cycles": as_plain(&walks),
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            if walks.is_empty() {
                println!("{}", output::success("No cycles.", &config));
                return Ok(());
            }
            println!("{} cycle(s):", walks.len());
            output::write_walks(&mut io::stdout().lock(), "Cycle", &walks, &config)?;
        }
    }
    Ok(())
}

/// Execute the paths command
pub fn execute_paths(app: &App, args: &PathsArgs, output_mode: OutputMode) -> Result<()> {
    let view = args.view.to_view(&app.config().workspace);
    restore_if_configured(app, &view);

    let paths = app.graph().paths_to(&view, &args.target)?;
    let walks = paths
        .iter()
        .map(|path| app.graph().resolve_path(path))
        .collect::<crate::error::Result<Vec<_>>>()?;
    persist_if_configured(app, &view)?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "view": view.long_id(),
            "target": args.target,
            "paths": as_plain(&walks),
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            if walks.is_empty() {
                println!("No paths to {}.", args.target);
                return Ok(());
            }
            println!("{} path(s) to {}:", walks.len(), args.target);
            output::write_walks(&mut io::stdout().lock(), "Path", &walks, &config)?;
        }
    }
    Ok(())
}

/// Execute the check-cycle command
pub fn execute_check_cycle(app: &App, args: &CheckCycleArgs, output_mode: OutputMode) -> Result<()> {
    let candidate = args
        .kind
        .candidate(args.declaring.clone(), args.target.clone());
    candidate.validate()?;
    let introduces = app.graph().introduces_cycle(&candidate)?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "relationship": candidate,
            "introduces_cycle": introduces,
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let line = output::format_relationship(&candidate, &config);
            if introduces {
                println!("{} {line}", output::error("Would introduce a cycle:", &config));
            } else {
                println!("{} {line}", output::success("No cycle:", &config));
            }
        }
    }
    Ok(())
}

/// Execute the build-order command
pub fn execute_build_order(app: &App, args: &BuildOrderArgs, output_mode: OutputMode) -> Result<()> {
    let view = args.view.to_view(&app.config().workspace);
    restore_if_configured(app, &view);

    let mut traversal = BuildOrderTraversal::new();
    app.graph().traverse(&view, &mut traversal)?;
    persist_if_configured(app, &view)?;
    let participants = traversal.cycle_participants();

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "view": view.long_id(),
            "order": traversal.build_order(),
            "cycle_participants": participants,
        }))?,
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            for (i, project) in traversal.build_order().iter().enumerate() {
                if participants.contains(project) {
                    println!("{:>4}. {project} {}", i + 1, output::warning("(cycle)", &config));
                } else {
                    println!("{:>4}. {project}", i + 1);
                }
            }
        }
    }
    Ok(())
}

/// Execute the ancestry command
pub fn execute_ancestry(app: &App, args: &AncestryArgs, output_mode: OutputMode) -> Result<()> {
    let view = app.view([args.project.clone()]);
    let mut traversal = AncestryTraversal::new();
    app.graph().traverse(&view, &mut traversal)?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "project": args.project,
            "ancestry": traversal.ancestry(),
        }))?,
        OutputMode::Text => {
            for (depth, project) in traversal.ancestry().iter().enumerate() {
                println!("{}{project}", "  ".repeat(depth));
            }
        }
    }
    Ok(())
}

/// Execute the resolve command
pub fn execute_resolve(app: &App, args: &ResolveArgs, output_mode: OutputMode) -> Result<()> {
    let view = args.view.to_view(&app.config().workspace);
    restore_if_configured(app, &view);

    let mut traversal = TransitiveDependencyTraversal::new();
    app.graph().traverse(&view, &mut traversal)?;
    persist_if_configured(app, &view)?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "view": view.long_id(),
            "artifacts": traversal.artifacts(),
        }))?,
        OutputMode::Text => {
            if traversal.artifacts().is_empty() {
                println!("No dependencies.");
            }
            for artifact in traversal.artifacts() {
                println!("  {artifact}");
            }
        }
    }
    Ok(())
}

fn as_plain(walks: &[Vec<Arc<ProjectRelationship>>]) -> Vec<Vec<&ProjectRelationship>> {
    walks
        .iter()
        .map(|walk| walk.iter().map(AsRef::as_ref).collect())
        .collect()
}
