//! Unit tests for the architecture lint.

use std::path::PathBuf;

use rstest::rstest;

use super::*;

fn lint_one(file: &str, contents: &str) -> Result<(), ArchitectureLintError> {
    lint_sources(&[LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    }])
}

#[rstest]
#[case(
    "inbound/cli/run.rs",
    "use crate::domain::{AuthSession, ApiRequest}; fn run() { let _ = ApiRequest::get(\"/x\"); }",
    true
)]
#[case(
    "inbound/cli/run.rs",
    "use crate::outbound::http::ReqwestTransport; fn run() { let _ = ReqwestTransport::new(); }",
    false
)]
#[case(
    "inbound/cli/run.rs",
    "use chatbot_console::outbound::storage::FileKeyValueStore; fn run() {}",
    false
)]
#[case(
    "inbound/cli/run.rs",
    "fn run() { let _ = super::super::outbound::http::ReqwestTransport::new(); }",
    false
)]
#[case("inbound/cli/run.rs", "use reqwest::Client; fn run() {}", false)]
#[case(
    "inbound/cli/local_files.rs",
    "use cap_std::{ambient_authority, fs::Dir}; fn open() {}",
    true
)]
#[case(
    "domain/dispatcher.rs",
    "use tracing::{debug, warn}; use crate::domain::ports::HttpTransport; fn call() {}",
    true
)]
#[case("domain/dispatcher.rs", "use reqwest::Client; fn call() {}", false)]
#[case(
    "domain/token_store.rs",
    "use cap_std::fs::Dir; fn load(_dir: Dir) {}",
    false
)]
#[case(
    "domain/auth.rs",
    "use crate::inbound::cli::CliError; fn login() {}",
    false
)]
#[case(
    "domain/auth.rs",
    "use clap::Args; #[derive(Args)] struct Login { email: String }",
    false
)]
#[case(
    "outbound/storage/file_store.rs",
    "use crate::inbound::cli::Cli; fn store() {}",
    false
)]
#[case("outbound/http/reqwest_transport.rs", "use clap::Parser; fn send() {}", false)]
#[case(
    "outbound/http/reqwest_transport.rs",
    "use reqwest::multipart::Form; use crate::domain::ports::TransportRequest; fn send() {}",
    true
)]
fn detects_boundary_violations(#[case] file: &str, #[case] contents: &str, #[case] ok: bool) {
    let result = lint_one(file, contents);
    assert_eq!(result.is_ok(), ok, "result: {result:?}");
}

#[rstest]
fn repeated_imports_report_one_violation_per_rule() {
    let result = lint_one(
        "domain/endpoints/chatbots.rs",
        "use reqwest::Client; use reqwest::Method; fn list(_c: reqwest::Client) {}",
    );

    let Err(ArchitectureLintError::Violations(violations)) = &result else {
        panic!("expected violations, got {result:?}");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(
        violations[0].message,
        "domain module must not depend on external crate `reqwest`"
    );
}

#[rstest]
#[case("main.rs")]
#[case("config.rs")]
fn files_outside_the_layers_are_rejected(#[case] file: &str) {
    let result = lint_one(file, "fn main() {}");
    assert!(
        matches!(result, Err(ArchitectureLintError::Parse { .. })),
        "result: {result:?}"
    );
}

#[rstest]
fn unparsable_source_reports_the_file() {
    let result = lint_one("domain/broken.rs", "fn broken( {");

    let Err(ArchitectureLintError::Parse { file, .. }) = &result else {
        panic!("expected parse error, got {result:?}");
    };
    assert_eq!(file, &PathBuf::from("domain/broken.rs"));
}
