//! Integration tests for the atlas CLI.
//!
//! These tests run the binary against temporary workspaces.

use rstest::{fixture, rstest};
use std::fs;
use tempfile::TempDir;

mod common;
use common::{dependency_line, run_atlas_in_dir, write_relationships};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Provides a fresh temporary directory for each test
#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Provides a temporary directory with an initialized atlas workspace
#[fixture]
fn initialized_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_atlas_in_dir(temp.path(), &["init", "--workspace", "test", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize atlas: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    temp
}

/// An initialized workspace holding the cycle app -> lib -> util -> lib
#[fixture]
fn cyclic_dir(initialized_dir: TempDir) -> TempDir {
    let lines = [
        dependency_line("g:app:1", "g:lib:1"),
        dependency_line("g:lib:1", "g:util:1"),
        dependency_line("g:util:1", "g:lib:1"),
    ];
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let file = write_relationships(initialized_dir.path(), "rels.jsonl", &refs);
    let output = run_atlas_in_dir(initialized_dir.path(), &["add", file.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "Failed to add relationships: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    initialized_dir
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ============================================================================
// Init
// ============================================================================

#[rstest]
fn test_init_creates_workspace(temp_dir: TempDir) {
    let output = run_atlas_in_dir(temp_dir.path(), &["init"]);
    assert!(output.status.success());
    assert!(temp_dir.path().join(".atlas/config.yaml").exists());
    assert!(temp_dir.path().join(".atlas/relationships.jsonl").exists());
}

#[rstest]
fn test_init_twice_fails(initialized_dir: TempDir) {
    let output = run_atlas_in_dir(initialized_dir.path(), &["init"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already initialized"));
}

#[rstest]
fn test_command_outside_workspace_fails(temp_dir: TempDir) {
    let output = run_atlas_in_dir(temp_dir.path(), &["cycles", "--root", "g:a:1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not an atlas workspace"));
}

// ============================================================================
// Add
// ============================================================================

#[rstest]
fn test_add_persists_to_data_file(cyclic_dir: TempDir) {
    let data = fs::read_to_string(cyclic_dir.path().join(".atlas/relationships.jsonl")).unwrap();
    assert_eq!(data.lines().count(), 3);
}

#[rstest]
fn test_add_again_reports_present(cyclic_dir: TempDir) {
    let file = cyclic_dir.path().join("rels.jsonl");
    let output = run_atlas_in_dir(cyclic_dir.path(), &["--json", "add", file.to_str().unwrap()]);
    let json = stdout_json(&output);
    assert_eq!(json["read"], 3);
    assert_eq!(json["already_present"], 3);
}

#[rstest]
fn test_add_rejects_malformed_line(initialized_dir: TempDir) {
    let file = write_relationships(initialized_dir.path(), "bad.jsonl", &["{not json"]);
    let output = run_atlas_in_dir(initialized_dir.path(), &["add", file.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.jsonl:1"));
}

// ============================================================================
// Queries
// ============================================================================

#[rstest]
fn test_cycles_json(cyclic_dir: TempDir) {
    let output = run_atlas_in_dir(cyclic_dir.path(), &["--json", "cycles", "--root", "g:app:1"]);
    let json = stdout_json(&output);
    let cycles = json["cycles"].as_array().unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].as_array().unwrap().len(), 2);
}

#[rstest]
fn test_cycles_hidden_by_filter(cyclic_dir: TempDir) {
    let output = run_atlas_in_dir(
        cyclic_dir.path(),
        &["--json", "cycles", "--root", "g:app:1", "--filter", "parents"],
    );
    let json = stdout_json(&output);
    assert!(json["cycles"].as_array().unwrap().is_empty());
}

#[rstest]
fn test_paths_text(cyclic_dir: TempDir) {
    let output = run_atlas_in_dir(
        cyclic_dir.path(),
        &["paths", "--root", "g:app:1", "--target", "g:util:1"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 path(s) to g:util:1"));
    assert!(stdout.contains("g:lib:1 dependency g:util:1"));
}

#[rstest]
#[case::closes_loop("g:util:1", "g:app:1", true)]
#[case::forward_edge("g:app:1", "g:util:1", false)]
fn test_check_cycle(
    cyclic_dir: TempDir,
    #[case] declaring: &str,
    #[case] target: &str,
    #[case] expected: bool,
) {
    let output = run_atlas_in_dir(cyclic_dir.path(), &["--json", "check-cycle", declaring, target]);
    let json = stdout_json(&output);
    assert_eq!(json["introduces_cycle"], expected);
}

#[rstest]
fn test_build_order_marks_cycle(cyclic_dir: TempDir) {
    let output = run_atlas_in_dir(cyclic_dir.path(), &["--json", "build-order", "--root", "g:app:1"]);
    let json = stdout_json(&output);
    assert_eq!(json["order"].as_array().unwrap().last().unwrap(), "g:app:1");
    let participants = json["cycle_participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
}

#[rstest]
fn test_traverse_lists_relationships(cyclic_dir: TempDir) {
    let output = run_atlas_in_dir(
        cyclic_dir.path(),
        &["--json", "traverse", "--root", "g:app:1", "--order", "breadth-first"],
    );
    let json = stdout_json(&output);
    assert_eq!(json["relationships"].as_array().unwrap().len(), 3);
    assert_eq!(json["summary"]["state"], "completed");
}

#[rstest]
fn test_persisted_cache_written(cyclic_dir: TempDir) {
    let config_path = cyclic_dir.path().join(".atlas/config.yaml");
    let config = fs::read_to_string(&config_path).unwrap();
    fs::write(&config_path, config.replace("persist: false", "persist: true")).unwrap();

    let output = run_atlas_in_dir(cyclic_dir.path(), &["cycles", "--root", "g:app:1"]);
    assert!(output.status.success());
    let data = fs::read_to_string(cyclic_dir.path().join(".atlas/relationships.jsonl")).unwrap();
    assert!(data.contains("path-cache:"));

    // A second run restores the cache and still sees the cycle
    let output = run_atlas_in_dir(cyclic_dir.path(), &["--json", "cycles", "--root", "g:app:1"]);
    let json = stdout_json(&output);
    assert_eq!(json["cycles"].as_array().unwrap().len(), 1);
}
