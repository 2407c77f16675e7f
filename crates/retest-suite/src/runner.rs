//! Fill/execute pipeline

use retest_document::Document;
use retest_rpc::{ClientConfig, RpcSession, SessionRegistry, SessionStatus, WorkerId};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{SuiteError, SuiteResult};
use crate::exit::ExitHandler;
use crate::files::{add_client_info, check_filler_hash, get_files, read_test_file};
use crate::options::{Options, TestSuiteOptions};
use crate::report::TestReport;

/// Source suffix of tests generated through a client
pub const FILLER_SUFFIX: &str = "Filler";

/// Source suffix of tests copied verbatim
pub const COPIER_SUFFIX: &str = "Copier";

/// What a worker needs to reach its own session
#[derive(Clone, Copy)]
pub struct WorkerContext<'a> {
    worker: WorkerId,
    registry: &'a SessionRegistry,
    options: &'a Options,
}

impl<'a> WorkerContext<'a> {
    /// Context for an explicit worker identity
    pub fn new(worker: WorkerId, registry: &'a SessionRegistry, options: &'a Options) -> Self {
        Self {
            worker,
            registry,
            options,
        }
    }

    /// Context for the calling thread
    pub fn current(registry: &'a SessionRegistry, options: &'a Options) -> Self {
        Self::new(WorkerId::current(), registry, options)
    }

    /// Worker identity
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Session registry
    pub fn registry(&self) -> &'a SessionRegistry {
        self.registry
    }

    /// Run options
    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// The worker's session
    pub fn session(&self) -> SuiteResult<Arc<RpcSession>> {
        Ok(self.registry.instance(self.worker)?)
    }
}

/// Suite-specific fill and execute algorithms
pub trait TestSuite: Send + Sync {
    /// Folder of compiled tests, relative to the test root
    fn suite_folder(&self) -> &str;

    /// Folder of sources, relative to `<test root>/src`
    fn filler_folder(&self) -> &str;

    /// Fill (`opts.do_filling`) or execute every test in `input`.
    ///
    /// Per-test failures go to `opts`; an `Err` fails the whole file. When
    /// filling, the returned document is the compiled test.
    fn do_tests(
        &self,
        ctx: &WorkerContext<'_>,
        input: &Document,
        opts: &mut TestSuiteOptions,
    ) -> SuiteResult<Document>;
}

/// Marks the worker finished and notifies the orchestrator, even on panic
struct CompletionGuard<'a> {
    worker: WorkerId,
    registry: &'a SessionRegistry,
    done: Sender<WorkerId>,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .session_end(self.worker, SessionStatus::HasFinished);
        // The orchestrator may already be gone when unwinding
        let _ = self.done.send(self.worker);
    }
}

/// Split a source file name into the test name and whether it is a copier
fn split_source_name(source: &Path) -> SuiteResult<(String, bool)> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let extension = source
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if let (Some(name), "json" | "yml") = (stem.strip_suffix(FILLER_SUFFIX), extension) {
        return Ok((name.to_string(), false));
    }
    // Copiers are always JSON
    if let (Some(name), "json") = (stem.strip_suffix(COPIER_SUFFIX), extension) {
        return Ok((name.to_string(), true));
    }
    Err(SuiteError::NamingConvention(format!(
        "Incorrect file suffix in the filler folder! {}",
        source.display()
    )))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs a [`TestSuite`] over test folders, once per client configuration
pub struct SuiteRunner<S> {
    suite: S,
    test_path: PathBuf,
    options: Options,
    registry: Arc<SessionRegistry>,
    clients: Vec<ClientConfig>,
    exit: ExitHandler,
    report: TestReport,
}

impl<S: TestSuite> SuiteRunner<S> {
    /// Create a runner
    pub fn new(
        suite: S,
        test_path: impl Into<PathBuf>,
        options: Options,
        registry: Arc<SessionRegistry>,
        clients: Vec<ClientConfig>,
    ) -> Self {
        Self {
            suite,
            test_path: test_path.into(),
            options,
            registry,
            clients,
            exit: ExitHandler::new(),
            report: TestReport::new(),
        }
    }

    /// Use a shared shutdown flag
    pub fn with_exit_handler(mut self, exit: ExitHandler) -> Self {
        self.exit = exit;
        self
    }

    /// The suite
    pub fn suite(&self) -> &S {
        &self.suite
    }

    /// Run options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Shutdown flag
    pub fn exit_handler(&self) -> &ExitHandler {
        &self.exit
    }

    /// Collected results
    pub fn report(&self) -> &TestReport {
        &self.report
    }

    /// `<root>/<suite folder>/<folder>`
    pub fn compiled_dir(&self, folder: &str) -> PathBuf {
        self.test_path.join(self.suite.suite_folder()).join(folder)
    }

    /// `<root>/src/<filler folder>/<folder>`
    pub fn source_dir(&self, folder: &str) -> PathBuf {
        self.test_path
            .join("src")
            .join(self.suite.filler_folder())
            .join(folder)
    }

    fn source_filter(&self) -> Vec<String> {
        match self.options.single_test() {
            Some(name) => vec![
                format!("{}{}", name, FILLER_SUFFIX),
                format!("{}{}", name, COPIER_SUFFIX),
            ],
            None => Vec::new(),
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.test_path)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Check every compiled test in `folder` against its source.
    ///
    /// Each compiled `<Name>.json` needs exactly one of `<Name>Filler.json`,
    /// `<Name>Filler.yml` and `<Name>Copier.json`; outside filling mode its
    /// recorded source hash must also be current. Failing tests are reported
    /// and their names returned so they are not dispatched.
    pub fn check_filler_existence(&self, folder: &str) -> SuiteResult<HashSet<String>> {
        let stems: Vec<String> = self
            .options
            .single_test()
            .map(|name| vec![name.to_string()])
            .unwrap_or_default();
        let compiled = get_files(&self.compiled_dir(folder), &[".json"], &stems)?;
        let source_dir = self.source_dir(folder);

        let mut rejected = HashSet::new();
        for file in compiled {
            let name = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let candidates = [
                source_dir.join(format!("{}{}.json", name, FILLER_SUFFIX)),
                source_dir.join(format!("{}{}.yml", name, FILLER_SUFFIX)),
                source_dir.join(format!("{}{}.json", name, COPIER_SUFFIX)),
            ];
            let existing: Vec<&PathBuf> = candidates.iter().filter(|p| p.exists()).collect();

            let check = match existing.as_slice() {
                [] => Err(SuiteError::NamingConvention(format!(
                    "Compiled test folder contains test without Filler: {}",
                    display_name(&file)
                ))),
                [source] if self.options.filltests => {
                    debug!("{} is filled from {}", display_name(&file), display_name(source));
                    Ok(())
                }
                [source] => check_filler_hash(&file, source),
                _ => Err(SuiteError::NamingConvention(format!(
                    "Src test could either be Filler.json, Filler.yml or Copier.json: {}",
                    display_name(&file)
                ))),
            };

            if let Err(e) = check {
                self.report.record_failure(&display_name(&file), e);
                self.report.record_failed();
                rejected.insert(name);
            }
        }
        Ok(rejected)
    }

    /// Fill (when enabled) and execute every test of `folder`, for every
    /// client configuration
    pub fn run_all_tests_in_folder(&self, folder: &str) -> SuiteResult<()> {
        if self.exit.should_exit() {
            self.exit.could_exit();
            return Ok(());
        }
        let start = Instant::now();

        let rejected = self.check_filler_existence(folder)?;
        let files: Vec<PathBuf> =
            get_files(&self.source_dir(folder), &[".json", ".yml"], &self.source_filter())?
                .into_iter()
                .filter(|file| match split_source_name(file) {
                    Ok((name, _)) => !rejected.contains(&name),
                    Err(_) => true,
                })
                .collect();
        info!(
            "Running {} {}/{} ({} files)",
            if self.options.filltests { "filling" } else { "tests" },
            self.suite.suite_folder(),
            folder,
            files.len()
        );

        self.run_for_all_clients(|_| self.dispatch(folder, &files));

        self.report.add_duration(start.elapsed());
        Ok(())
    }

    /// Run `body` once per client configuration, clearing every session
    /// after each one
    pub fn run_for_all_clients(&self, mut body: impl FnMut(&ClientConfig)) {
        for config in &self.clients {
            self.registry.configure(config.clone());
            info!("Running tests for config '{}' {}", config.name, config.id);
            body(config);
            self.registry.clear();
        }
    }

    /// Launch one worker per file, at most `thread_count` at a time
    fn dispatch(&self, folder: &str, files: &[PathBuf]) {
        let limit = self.options.threads();
        let (done_tx, done_rx) = mpsc::channel::<WorkerId>();

        thread::scope(|scope| {
            let mut running: HashMap<WorkerId, ScopedJoinHandle<'_, ()>> = HashMap::new();

            for (launched, file) in files.iter().enumerate() {
                if running.len() >= limit {
                    self.join_first_finished(&done_rx, &mut running);
                }
                if self.exit.should_exit() {
                    warn!(
                        "Exit requested, {} of {} files not started",
                        files.len() - launched,
                        files.len()
                    );
                    break;
                }

                let done = done_tx.clone();
                let handle = scope.spawn(move || {
                    let ctx = WorkerContext::current(&self.registry, &self.options);
                    let _guard = CompletionGuard {
                        worker: ctx.worker(),
                        registry: ctx.registry(),
                        done,
                    };
                    self.execute_test(&ctx, folder, file);
                });
                running.insert(WorkerId::from(handle.thread().id()), handle);
            }

            for (worker, handle) in running.drain() {
                self.join_worker(worker, handle);
            }
        });

        if self.exit.should_exit() {
            self.exit.could_exit();
        }
    }

    /// Block until any worker reports completion, then join it
    fn join_first_finished(
        &self,
        done: &Receiver<WorkerId>,
        running: &mut HashMap<WorkerId, ScopedJoinHandle<'_, ()>>,
    ) {
        while let Ok(worker) = done.recv() {
            if let Some(handle) = running.remove(&worker) {
                self.join_worker(worker, handle);
                return;
            }
        }
    }

    fn join_worker(&self, worker: WorkerId, handle: ScopedJoinHandle<'_, ()>) {
        if handle.join().is_err() {
            self.report
                .record_failure(&format!("worker {}", worker), "worker panicked");
            self.report.record_failed();
        }
        self.registry.session_end(worker, SessionStatus::Available);
    }

    /// Worker body: fill and/or execute one source file, recording the outcome
    pub fn execute_test(&self, ctx: &WorkerContext<'_>, folder: &str, source: &Path) {
        let label = display_name(source);
        match self.fill_and_execute(ctx, folder, source) {
            Ok(failures) if failures.is_empty() => self.report.record_pass(&label),
            Ok(failures) => {
                for (test, reason) in failures {
                    self.report
                        .record_failure(&format!("{}::{}", label, test), reason);
                }
                self.report.record_failed();
            }
            Err(e) => {
                self.report.record_failure(&label, e);
                self.report.record_failed();
                ctx.registry()
                    .session_end(ctx.worker(), SessionStatus::HasFinished);
            }
        }
    }

    fn fill_and_execute(
        &self,
        ctx: &WorkerContext<'_>,
        folder: &str,
        source: &Path,
    ) -> SuiteResult<Vec<(String, String)>> {
        ctx.registry().session_start(ctx.worker())?;
        let (test_name, is_copier) = split_source_name(source)?;
        let compiled = self.compiled_dir(folder).join(format!("{}.json", test_name));

        if self.options.filltests {
            if let Some(parent) = compiled.parent() {
                fs::create_dir_all(parent)?;
            }
            if is_copier {
                info!("Copying {} to {}", source.display(), compiled.display());
                fs::copy(source, &compiled)?;
            } else {
                let mut test_data = read_test_file(source)?;
                test_data.data.strip_comments();

                let mut opts = TestSuiteOptions::filling();
                let mut output = self.suite.do_tests(ctx, &test_data.data, &mut opts)?;
                if opts.was_errors {
                    return Ok(opts.failures);
                }

                let session = ctx.session()?;
                add_client_info(
                    &mut output,
                    &self.relative(source),
                    &test_data.hash,
                    session.web3_client_version(),
                )?;
                fs::write(&compiled, output.serialize_pretty())?;
                debug!("Filled {}", compiled.display());
            }
        }

        debug!("TEST {}:", test_name);
        let opts = self.execute_file(ctx, &compiled)?;
        Ok(opts.failures)
    }

    /// Execute one compiled test file with the worker's session
    pub fn execute_file(&self, ctx: &WorkerContext<'_>, path: &Path) -> SuiteResult<TestSuiteOptions> {
        let input = Document::parse(&fs::read_to_string(path)?)?;
        let mut opts = TestSuiteOptions::default();
        self.suite.do_tests(ctx, &input, &mut opts)?;
        Ok(opts)
    }

    /// Execute an arbitrary compiled file outside the folder layout, once per
    /// client configuration
    pub fn run_test_without_filler(&self, path: &Path) {
        let label = display_name(path);
        let start = Instant::now();
        self.run_for_all_clients(|_| {
            let ctx = WorkerContext::current(&self.registry, &self.options);
            let outcome = ctx
                .registry()
                .session_start(ctx.worker())
                .map_err(SuiteError::from)
                .and_then(|_| self.execute_file(&ctx, path));
            match outcome {
                Ok(opts) if opts.failures.is_empty() => self.report.record_pass(&label),
                Ok(opts) => {
                    for (test, reason) in opts.failures {
                        self.report
                            .record_failure(&format!("{}::{}", label, test), reason);
                    }
                    self.report.record_failed();
                }
                Err(e) => {
                    self.report.record_failure(&label, e);
                    self.report.record_failed();
                }
            }
            ctx.registry()
                .session_end(ctx.worker(), SessionStatus::HasFinished);
        });
        self.report.add_duration(start.elapsed());
    }
}
