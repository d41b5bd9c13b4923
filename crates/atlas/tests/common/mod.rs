//! Common test utilities shared across integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// The atlas binary built for this test run
pub fn atlas_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_atlas"))
}

/// Run the atlas binary in the specified directory
pub fn run_atlas_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(atlas_binary())
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute atlas binary")
}

/// Write one relationship per line to `name` inside `dir`
pub fn write_relationships(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).expect("Failed to write relationship file");
    path
}

/// A compile-scope dependency line
pub fn dependency_line(from: &str, to: &str) -> String {
    format!(
        r#"{{"kind":"dependency","declaring":"{from}","target":{{"gav":"{to}","type":"jar"}},"index":0,"managed":false,"scope":"compile"}}"#
    )
}
