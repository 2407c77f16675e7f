//! # retest-suite
//!
//! Fill/execute pipeline of the retest harness.
//!
//! - `SuiteRunner`: per-folder pipeline (freshness check, filling, bounded
//!   worker pool, per-client repetition, cooperative shutdown)
//! - `TestSuite`: the seam a test family implements
//! - `StateTestSuite`: general state tests
//! - `TestReport`: run statistics shared by all workers

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod exit;
mod files;
mod options;
mod report;
mod runner;

pub use error::{SuiteError, SuiteResult};
pub use exit::ExitHandler;
pub use files::{
    add_client_info, check_filler_hash, get_files, read_test_file, TestFileData,
    COMPILER_VERSION, INFO_KEY, TOOL_VERSION,
};
pub use options::{Options, TestSuiteOptions};
pub use report::{TestReport, TestStats};
pub use runner::{SuiteRunner, TestSuite, WorkerContext, COPIER_SUFFIX, FILLER_SUFFIX};
pub use state_test::{StateTestSuite, ENV_FIELDS};
