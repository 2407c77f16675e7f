//! retest binary
//!
//! Fills compiled tests from their sources through a reference client and
//! executes them against every configured client.
//!
//! ```bash
//! # Execute all state tests of one folder against ~/.retest/clients.toml
//! retest --testpath ./tests --folder stExample -j 4
//!
//! # Regenerate one test with a specific client
//! retest --testpath ./tests --folder stExample --singletest add11 --filltests --clients geth
//!
//! # Execute a single compiled file
//! retest run-file ./add11.json
//! ```

mod cli;
mod config;
mod error;

use anyhow::Result;
use cli::{Cli, Command};
use config::load_clients;
use error::CliError;
use retest_rpc::SessionRegistry;
use retest_suite::{ExitHandler, StateTestSuite, SuiteRunner, TestSuite};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let clients = load_clients(cli.config_dir.as_deref(), &cli.client_names())?;
    let suite = match cli.suite.as_str() {
        "GeneralStateTests" => StateTestSuite,
        other => return Err(CliError::UnknownSuite(other.to_string()).into()),
    };

    let exit = ExitHandler::new();
    let signal_exit = exit.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, waiting for running tests");
            signal_exit.request_exit();
        }
    });

    let runner = SuiteRunner::new(
        suite,
        cli.testpath.clone(),
        cli.options(),
        Arc::new(SessionRegistry::http()),
        clients,
    )
    .with_exit_handler(exit.clone());

    let command = cli.command.clone();
    let requested = cli.folders.clone();
    let stats = tokio::task::spawn_blocking(move || -> Result<_> {
        match command {
            Some(Command::RunFile { path }) => runner.run_test_without_filler(&path),
            None => {
                for folder in test_folders(&runner, &requested)? {
                    if runner.exit_handler().should_exit() {
                        break;
                    }
                    runner.run_all_tests_in_folder(&folder)?;
                }
            }
        }
        Ok(runner.report().stats())
    })
    .await??;

    stats.print_summary();
    if exit.should_exit() {
        tracing::info!("Stopped on request");
    }
    if stats.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Requested folders, or every folder found under the suite's source and
/// compiled directories
fn test_folders<S: TestSuite>(runner: &SuiteRunner<S>, requested: &[String]) -> Result<Vec<String>> {
    if !requested.is_empty() {
        return Ok(requested.to_vec());
    }
    let mut folders = BTreeSet::new();
    for root in [runner.source_dir(""), runner.compiled_dir("")] {
        collect_subdirs(&root, &mut folders)?;
    }
    if folders.is_empty() {
        tracing::warn!("No test folders found for {}", runner.suite().suite_folder());
    }
    Ok(folders.into_iter().collect())
}

fn collect_subdirs(root: &Path, into: &mut BTreeSet<String>) -> Result<()> {
    if !root.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                into.insert(name.to_string());
            }
        }
    }
    Ok(())
}
