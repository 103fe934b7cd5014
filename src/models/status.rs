use serde::{Deserialize, Serialize};

/// Canonical outcome of a single test. Native `pending` is spelled `skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    #[default]
    Passed,
    Failed,
    #[serde(alias = "pending")]
    Skipped,
    Todo,
    TimedOut,
}

impl TestStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            TestStatus::Passed => "✔",
            TestStatus::Failed => "✘",
            TestStatus::Skipped => "⊘",
            TestStatus::Todo => "◌",
            TestStatus::TimedOut => "⧖",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Todo => "todo",
            TestStatus::TimedOut => "timedOut",
        }
    }

    /// Failure-class statuses carry an error and count toward `failedTests`.
    pub fn is_failure(&self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::TimedOut)
    }

    /// Statuses counted as `skippedTests`.
    pub fn is_skipped(&self) -> bool {
        matches!(self, TestStatus::Skipped | TestStatus::Todo)
    }

    /// Map a framework's native status word onto the canonical set.
    /// Unknown words are treated as skipped so no test is dropped.
    pub fn from_native(state: &str) -> Self {
        match state {
            "passed" | "pass" | "passes" => TestStatus::Passed,
            "failed" | "fail" | "failures" => TestStatus::Failed,
            "todo" => TestStatus::Todo,
            "timedOut" | "timedout" | "timeout" => TestStatus::TimedOut,
            _ => TestStatus::Skipped,
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suite outcome: `failed` if any member test failed, else `passed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuiteStatus {
    #[default]
    Passed,
    Failed,
}

impl SuiteStatus {
    pub fn absorb(&mut self, test: TestStatus) {
        if test.is_failure() {
            *self = SuiteStatus::Failed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_spelling() {
        assert_eq!(serde_json::to_string(&TestStatus::TimedOut).unwrap(), r#""timedOut""#);
        assert_eq!(serde_json::to_string(&TestStatus::Skipped).unwrap(), r#""skipped""#);
        assert_eq!(serde_json::to_string(&SuiteStatus::Failed).unwrap(), r#""failed""#);
    }

    #[test]
    fn pending_reads_as_skipped() {
        let status: TestStatus = serde_json::from_str(r#""pending""#).unwrap();
        assert_eq!(status, TestStatus::Skipped);
        assert_eq!(TestStatus::from_native("pending"), TestStatus::Skipped);
        assert_eq!(TestStatus::from_native("disabled"), TestStatus::Skipped);
    }

    #[test]
    fn suite_status_turns_failed_on_timeout() {
        let mut status = SuiteStatus::Passed;
        status.absorb(TestStatus::Skipped);
        assert_eq!(status, SuiteStatus::Passed);
        status.absorb(TestStatus::TimedOut);
        assert_eq!(status, SuiteStatus::Failed);
        status.absorb(TestStatus::Passed);
        assert_eq!(status, SuiteStatus::Failed);
    }
}
