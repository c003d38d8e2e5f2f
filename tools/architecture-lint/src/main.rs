//! Runs the architecture lint over `console/src` and reports violations on
//! stderr.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stderr = io::stderr().lock();
    let Some(root) = workspace_root() else {
        let _ = writeln!(
            stderr,
            "no Cargo.toml with a [workspace] table found above the current directory"
        );
        return ExitCode::FAILURE;
    };
    if let Err(err) = architecture_lint::lint_console_sources(&root.join("console")) {
        let _ = writeln!(stderr, "{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// First ancestor of `CARGO_WORKSPACE_DIR`, the current directory or this
/// crate's manifest directory that holds a workspace manifest.
fn workspace_root() -> Option<PathBuf> {
    let candidates = [
        env::var_os("CARGO_WORKSPACE_DIR").map(PathBuf::from),
        env::current_dir().ok(),
        Some(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|start| start.ancestors().find(|dir| declares_workspace(dir)).map(Path::to_path_buf))
}

fn declares_workspace(dir: &Path) -> bool {
    fs::read_to_string(dir.join("Cargo.toml")).is_ok_and(|manifest| {
        manifest.lines().any(|line| line.trim() == "[workspace]")
    })
}
