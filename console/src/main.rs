//! `chatbot-console` entry point: wires settings, adapters and the CLI.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use chatbot_console::ConsoleSettings;
use chatbot_console::domain::endpoints::ConsoleApi;
use chatbot_console::domain::{AuthSession, DispatcherConfig, RequestDispatcher};
use chatbot_console::inbound::cli::{Cli, Console, drain_redirects};
use chatbot_console::outbound::http::ReqwestTransport;
use chatbot_console::outbound::storage::FileKeyValueStore;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = ConsoleSettings::load_from_iter([OsString::from("chatbot-console")])
        .map_err(|error| eyre!("load console settings: {error}"))?;
    cli.global.apply_to(&mut settings);

    let base_url = settings.base_url()?;
    let token_file = settings.token_file();
    let storage = FileKeyValueStore::open(&token_file)
        .wrap_err_with(|| format!("open credential store at {}", token_file.display()))?;
    let transport = ReqwestTransport::new().wrap_err("build HTTP client")?;

    let config = DispatcherConfig::new(base_url.as_str().trim_end_matches('/'))
        .with_base_path(settings.base_path());
    let dispatcher = RequestDispatcher::new(Arc::new(transport), Arc::new(storage), config);
    let mut events = dispatcher.session().subscribe();
    let console = Console::new(
        AuthSession::new(dispatcher.clone(), settings.login_path()),
        ConsoleApi::new(dispatcher),
    );

    let outcome = console
        .execute(cli.command, &mut io::stdin().lock())
        .await;
    drain_redirects(&mut events);

    match outcome {
        Ok(value) => {
            write_json(&mut io::stdout().lock(), &value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            let normalized = serde_json::to_value(error.normalized())?;
            write_json(&mut io::stderr().lock(), &normalized)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn write_json(out: &mut impl Write, value: &Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
