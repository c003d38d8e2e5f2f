//! Behaviour tests for the console architecture guardrails.
//!
//! Each scenario writes a small `console/src` tree to a temporary directory
//! and runs the on-disk entry point over it.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use architecture_lint::{ArchitectureLintError, LintSource, Violation};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

#[derive(Debug, Default)]
struct LintWorld {
    sources: Vec<LintSource>,
    result: Option<Result<(), ArchitectureLintError>>,
}

#[fixture]
fn world() -> Mutex<LintWorld> {
    Mutex::new(LintWorld::default())
}

fn add_source(world: &Mutex<LintWorld>, file: &str, contents: &str) {
    world.lock().expect("world lock").sources.push(LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    });
}

fn violations(world: &Mutex<LintWorld>) -> Vec<Violation> {
    let world = world.lock().expect("world lock");
    match world.result.as_ref().expect("lint must have run") {
        Err(ArchitectureLintError::Violations(violations)) => violations.clone(),
        other => panic!("expected violations, got: {other:?}"),
    }
}

#[given("a domain pipeline, a command line surface and both outbound adapters")]
fn clean_layers(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "domain/dispatcher.rs",
        "use std::sync::Arc; use tracing::debug; use crate::domain::ports::HttpTransport; \
         pub struct RequestDispatcher { transport: Arc<dyn HttpTransport> }",
    );
    add_source(
        world,
        "inbound/cli/args.rs",
        "use clap::Parser; use crate::domain::UserRole; #[derive(Parser)] pub struct Cli { role: UserRole }",
    );
    add_source(
        world,
        "outbound/http/reqwest_transport.rs",
        "use reqwest::Client; use crate::domain::ports::HttpTransport; pub struct ReqwestTransport { client: Client }",
    );
    add_source(
        world,
        "outbound/storage/file_store.rs",
        "use cap_std::fs::Dir; use crate::domain::ports::KeyValueStore; pub struct FileKeyValueStore { dir: Dir }",
    );
}

#[given("a command line module that builds the reqwest transport itself")]
fn inbound_builds_transport(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "inbound/cli/run.rs",
        "use crate::outbound::http::ReqwestTransport; fn run() { let _ = ReqwestTransport::new(); }",
    );
}

#[given("a domain module that imports reqwest")]
fn domain_imports_reqwest(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "domain/dispatcher.rs",
        "use reqwest::Client; fn call(client: &Client) { let _ = client; }",
    );
}

#[given("a storage adapter that imports clap")]
fn storage_imports_clap(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "outbound/storage/file_store.rs",
        "use clap::Args; #[derive(Args)] pub struct StoreArgs { path: String }",
    );
}

#[when("the architecture lint runs over the console sources")]
fn run_architecture_lint(world: &Mutex<LintWorld>) {
    let sources = world.lock().expect("world lock").sources.clone();

    let temp_dir = TempDir::new().expect("tempdir");
    let console_dir = temp_dir.path().join("console");
    let src_dir = console_dir.join("src");
    for source in &sources {
        let path = src_dir.join(&source.file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        // Later sources replace earlier ones at the same path.
        fs::write(&path, &source.contents).expect("write source file");
    }

    let result = architecture_lint::lint_console_sources(&console_dir);
    world.lock().expect("world lock").result = Some(result);
}

#[then("the lint succeeds")]
fn lint_succeeds(world: &Mutex<LintWorld>) {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    assert!(outcome.is_ok(), "expected success, got: {outcome:?}");
}

#[then("the lint reports \"{expected}\" in \"{file}\"")]
fn lint_reports(world: &Mutex<LintWorld>, expected: String, file: String) {
    let file = PathBuf::from(file);
    let violations = violations(world);
    assert!(
        violations
            .iter()
            .any(|violation| violation.file == file && violation.message.contains(&expected)),
        "expected violation in {file:?} containing {expected:?}, got: {violations:?}"
    );
}

#[then("{count} violations are reported")]
fn violations_are_reported(world: &Mutex<LintWorld>, count: usize) {
    let violations = violations(world);
    assert_eq!(violations.len(), count, "got: {violations:?}");
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Clean layers pass the lint"
)]
fn clean_layers_pass(world: Mutex<LintWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Command line reaches for the HTTP adapter"
)]
fn command_line_reaches_for_http_adapter(world: Mutex<LintWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Domain talks to the HTTP client directly"
)]
fn domain_talks_to_http_client(world: Mutex<LintWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Credential storage parses command line flags"
)]
fn storage_parses_flags(world: Mutex<LintWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Every violation is listed"
)]
fn every_violation_is_listed(world: Mutex<LintWorld>) {
    drop(world);
}
