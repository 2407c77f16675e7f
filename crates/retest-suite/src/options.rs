//! Run options

/// Options for one harness run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Regenerate compiled tests from their sources before executing them
    pub filltests: bool,
    /// Restrict the run to one test name
    pub single_test_name: Option<String>,
    /// Maximum number of concurrent workers
    pub thread_count: usize,
    /// Fetch and print the full post state after each transaction
    pub poststate: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            filltests: false,
            single_test_name: None,
            thread_count: 1,
            poststate: false,
        }
    }
}

impl Options {
    /// Worker pool size, at least one
    pub fn threads(&self) -> usize {
        self.thread_count.max(1)
    }

    /// The single-test filter, if any
    pub fn single_test(&self) -> Option<&str> {
        self.single_test_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Per-file state handed to a suite's `do_tests`
#[derive(Debug, Clone, Default)]
pub struct TestSuiteOptions {
    /// Whether the suite is generating a compiled test
    pub do_filling: bool,
    /// Whether any test in the file failed
    pub was_errors: bool,
    /// Failed tests with reasons
    pub failures: Vec<(String, String)>,
}

impl TestSuiteOptions {
    /// Options for filling
    pub fn filling() -> Self {
        Self {
            do_filling: true,
            ..Self::default()
        }
    }

    /// Record a failed test
    pub fn fail(&mut self, test: impl Into<String>, reason: impl ToString) {
        self.was_errors = true;
        self.failures.push((test.into(), reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads_at_least_one() {
        let options = Options {
            thread_count: 0,
            ..Options::default()
        };
        assert_eq!(options.threads(), 1);
    }

    #[test]
    fn test_empty_single_test_is_no_filter() {
        let options = Options {
            single_test_name: Some(String::new()),
            ..Options::default()
        };
        assert_eq!(options.single_test(), None);
    }

    #[test]
    fn test_fail_sets_was_errors() {
        let mut opts = TestSuiteOptions::filling();
        assert!(opts.do_filling);
        opts.fail("add11", "boom");
        assert!(opts.was_errors);
        assert_eq!(opts.failures, vec![("add11".to_string(), "boom".to_string())]);
    }
}
