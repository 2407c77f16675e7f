//! CLI argument parsing for retest

use clap::{Parser, Subcommand};
use retest_suite::Options;
use std::path::PathBuf;

/// Blockchain client conformance harness
#[derive(Parser, Debug, Clone)]
#[command(name = "retest")]
#[command(about = "Fill and execute blockchain client tests over JSON-RPC")]
#[command(version)]
pub struct Cli {
    /// Root of the tests repository
    #[arg(long, default_value = ".")]
    pub testpath: PathBuf,

    /// Test suite to run
    #[arg(long, default_value = "GeneralStateTests")]
    pub suite: String,

    /// Test folder inside the suite (repeatable; all folders when omitted)
    #[arg(long = "folder")]
    pub folders: Vec<String>,

    /// Regenerate compiled tests from their fillers before executing them
    #[arg(long)]
    pub filltests: bool,

    /// Run only the test with this name
    #[arg(long)]
    pub singletest: Option<String>,

    /// Maximum number of concurrent workers
    #[arg(short = 'j', long, default_value = "1")]
    pub threads: usize,

    /// Client configurations to use (comma-separated names; all when omitted)
    #[arg(long, default_value = "")]
    pub clients: String,

    /// Directory holding clients.toml (default ~/.retest)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Fetch and print the full post state after every transaction
    #[arg(long)]
    pub poststate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute one compiled test file outside the test tree
    RunFile {
        /// Compiled test file
        path: PathBuf,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Run options for the pipeline
    pub fn options(&self) -> Options {
        Options {
            filltests: self.filltests,
            single_test_name: self.singletest.clone(),
            thread_count: self.threads.max(1),
            poststate: self.poststate,
        }
    }

    /// Requested client names
    pub fn client_names(&self) -> Vec<String> {
        self.clients
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["retest"]);
        assert_eq!(cli.testpath, PathBuf::from("."));
        assert_eq!(cli.suite, "GeneralStateTests");
        assert!(cli.folders.is_empty());
        assert!(!cli.filltests);
        assert_eq!(cli.threads, 1);
        assert!(cli.client_names().is_empty());
        assert!(cli.command.is_none());
        assert_eq!(cli.options(), Options::default());
    }

    #[test]
    fn test_cli_custom_values() {
        let cli = Cli::parse_from([
            "retest",
            "--testpath", "/tmp/tests",
            "--folder", "stExample",
            "--folder", "stCallCodes",
            "--filltests",
            "--singletest", "add11",
            "-j", "4",
            "--clients", "geth, besu",
            "--config-dir", "/etc/retest",
            "--poststate",
            "--log-level", "debug",
        ]);
        assert_eq!(cli.testpath, PathBuf::from("/tmp/tests"));
        assert_eq!(cli.folders, vec!["stExample", "stCallCodes"]);
        assert_eq!(cli.client_names(), vec!["geth", "besu"]);
        assert_eq!(cli.config_dir, Some(PathBuf::from("/etc/retest")));
        assert_eq!(cli.log_level, "debug");

        let options = cli.options();
        assert!(options.filltests);
        assert!(options.poststate);
        assert_eq!(options.thread_count, 4);
        assert_eq!(options.single_test(), Some("add11"));
    }

    #[test]
    fn test_zero_threads_clamped() {
        let cli = Cli::parse_from(["retest", "--threads", "0"]);
        assert_eq!(cli.options().thread_count, 1);
    }

    #[test]
    fn test_run_file_subcommand() {
        let cli = Cli::parse_from(["retest", "run-file", "/tmp/add11.json"]);
        match cli.command {
            Some(Command::RunFile { path }) => assert_eq!(path, PathBuf::from("/tmp/add11.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
