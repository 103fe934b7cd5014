//! Read-only accessors over a [`CanonicalResult`].
//!
//! Everything returned is an owned clone, so callers may keep it after the
//! result is dropped. None of these fail: a result with no suites or a
//! ParseError result simply yields empty lists or `false`.

use crate::models::{CanonicalResult, LocatedTest, Summary, Test, TestError};

fn collect(result: &CanonicalResult, keep: impl Fn(&Test) -> bool) -> Vec<LocatedTest> {
    result
        .tests()
        .filter(|(_, test)| keep(test))
        .map(|(suite, test)| LocatedTest::new(suite, test))
        .collect()
}

/// Failed and timed-out tests, each tagged with its suite.
pub fn failed_tests(result: &CanonicalResult) -> Vec<LocatedTest> {
    collect(result, |t| t.status.is_failure())
}

pub fn passed_tests(result: &CanonicalResult) -> Vec<LocatedTest> {
    collect(result, |t| !t.status.is_failure() && !t.status.is_skipped())
}

/// Skipped (native `pending`) and todo tests.
pub fn skipped_tests(result: &CanonicalResult) -> Vec<LocatedTest> {
    collect(result, |t| t.status.is_skipped())
}

pub fn summary(result: &CanonicalResult) -> Summary {
    result.summary.clone()
}

pub fn is_successful(result: &CanonicalResult) -> bool {
    result.summary.success
}

pub fn error_details(test: &Test) -> Option<TestError> {
    test.error.clone()
}

pub fn test_file_path(test: &Test) -> String {
    test.file_path.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Suite, TestStatus};

    fn sample() -> CanonicalResult {
        let test = |name: &str, status| Test {
            id: name.into(),
            name: name.into(),
            full_name: name.into(),
            status,
            ..Test::default()
        };
        CanonicalResult {
            test_suites: vec![Suite {
                name: "math".into(),
                file_path: "test/math.js".into(),
                tests: vec![
                    test("adds", TestStatus::Passed),
                    test("divides", TestStatus::Failed),
                    test("rounds", TestStatus::Skipped),
                    test("later", TestStatus::Todo),
                    test("hangs", TestStatus::TimedOut),
                ],
                ..Suite::default()
            }],
            ..CanonicalResult::default()
        }
    }

    #[test]
    fn partitions_by_status() {
        let result = sample();
        let failed: Vec<_> = failed_tests(&result).into_iter().map(|t| t.test.name).collect();
        let passed: Vec<_> = passed_tests(&result).into_iter().map(|t| t.test.name).collect();
        let skipped: Vec<_> = skipped_tests(&result).into_iter().map(|t| t.test.name).collect();
        assert_eq!(failed, ["divides", "hangs"]);
        assert_eq!(passed, ["adds"]);
        assert_eq!(skipped, ["rounds", "later"]);
    }

    #[test]
    fn annotates_with_suite() {
        let failed = failed_tests(&sample());
        assert_eq!(failed[0].suite_name, "math");
        assert_eq!(failed[0].file_path, "test/math.js");
    }

    #[test]
    fn empty_result_is_safe() {
        let empty = CanonicalResult::default();
        assert!(failed_tests(&empty).is_empty());
        assert!(!is_successful(&empty));
        assert_eq!(summary(&empty).total_tests, 0);
        assert_eq!(test_file_path(&Test::default()), "");
        assert!(error_details(&Test::default()).is_none());
    }
}
