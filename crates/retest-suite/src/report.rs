//! Run statistics shared by all workers

use parking_lot::Mutex;
use std::time::Duration;

/// Aggregated test statistics
#[derive(Debug, Clone, Default)]
pub struct TestStats {
    /// File runs that reached a terminal state, one per client
    /// configuration for dispatched files
    pub total: usize,
    /// File runs without failure
    pub passed: usize,
    /// File runs with at least one failure
    pub failed: usize,
    /// Total execution time
    pub duration: Duration,
    /// Failed test names with reasons
    pub failures: Vec<(String, String)>,
}

impl TestStats {
    /// Pass rate as percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.passed as f64 / self.total as f64) * 100.0
    }

    /// Print summary
    pub fn print_summary(&self) {
        println!("\n========================================");
        println!("Test Summary");
        println!("========================================");
        println!("Total:   {}", self.total);
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Pass Rate: {:.2}%", self.pass_rate());
        println!("Duration: {:.2}s", self.duration.as_secs_f64());

        if !self.failures.is_empty() {
            println!("\nFailed tests:");
            for (name, reason) in &self.failures {
                println!("  - {}: {}", name, reason);
            }
        }
    }
}

/// Thread-safe collector of [`TestStats`]
#[derive(Debug, Default)]
pub struct TestReport {
    stats: Mutex<TestStats>,
}

impl TestReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// A file ran without failures
    pub fn record_pass(&self, name: &str) {
        let mut stats = self.stats.lock();
        stats.total += 1;
        stats.passed += 1;
        tracing::debug!("PASS: {}", name);
    }

    /// Record one failure reason; the file run is counted by [`Self::record_failed`]
    pub fn record_failure(&self, name: &str, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!("FAIL: {} - {}", name, reason);
        self.stats.lock().failures.push((name.to_string(), reason));
    }

    /// A file run finished with its failures already recorded
    pub fn record_failed(&self) {
        let mut stats = self.stats.lock();
        stats.total += 1;
        stats.failed += 1;
    }

    /// Add wall time
    pub fn add_duration(&self, elapsed: Duration) {
        self.stats.lock().duration += elapsed;
    }

    /// Copy of the current statistics
    pub fn stats(&self) -> TestStats {
        self.stats.lock().clone()
    }

    /// Whether any failure was recorded
    pub fn has_failures(&self) -> bool {
        let stats = self.stats.lock();
        stats.failed > 0 || !stats.failures.is_empty()
    }
}
