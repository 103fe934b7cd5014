//! Plain-text renderings of canonical results for terminal output.

use std::fmt::Write;

use crate::models::{CanonicalResult, TestStatus};
use crate::parser::query;
use crate::parser::text::first_line;

/// One line per run: icon, framework, source label and counts.
pub fn summary_line(label: &str, result: &CanonicalResult) -> String {
    let summary = &result.summary;
    let icon = if summary.success {
        TestStatus::Passed.icon()
    } else {
        TestStatus::Failed.icon()
    };

    if result.is_parse_error() {
        return format!(
            "{} {} {}: could not parse output",
            icon, result.metadata.framework, label
        );
    }

    format!(
        "{} {} {}: {} tests, {} passed, {} failed, {} skipped  {:.1}s",
        icon,
        result.metadata.framework,
        label,
        summary.total_tests,
        summary.passed_tests,
        summary.failed_tests,
        summary.skipped_tests,
        summary.duration as f64 / 1000.0,
    )
}

/// Every failed test with its suite, file and first error line.
pub fn failure_list(label: &str, result: &CanonicalResult) -> String {
    let failed = query::failed_tests(result);
    let mut out = String::new();
    if failed.is_empty() {
        return out;
    }

    let _ = writeln!(out, "{}:", label);
    for located in &failed {
        let _ = write!(
            out,
            "  {} {} › {}",
            located.test.status.icon(),
            located.suite_name,
            located.test.name
        );
        if !located.file_path.is_empty() {
            let _ = write!(out, "  ({})", located.file_path);
        }
        out.push('\n');
        if let Some(error) = &located.test.error {
            let line = first_line(&error.message);
            if line.is_empty() {
                let _ = writeln!(out, "      {}", error.kind);
            } else {
                let _ = writeln!(out, "      {}: {}", error.kind, line);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Suite, Summary, Test, TestError};

    fn failing_result() -> CanonicalResult {
        let mut result = CanonicalResult {
            summary: Summary {
                total_tests: 2,
                passed_tests: 1,
                failed_tests: 1,
                duration: 1500,
                ..Summary::default()
            },
            test_suites: vec![Suite {
                name: "math".into(),
                file_path: "test/math.js".into(),
                tests: vec![Test {
                    name: "divides".into(),
                    status: TestStatus::Failed,
                    error: Some(TestError {
                        message: "expected 1 to equal 2\n  more".into(),
                        kind: "AssertionError".into(),
                        ..TestError::default()
                    }),
                    ..Test::default()
                }],
                ..Suite::default()
            }],
            ..CanonicalResult::default()
        };
        result.metadata.framework = "mocha".into();
        result
    }

    #[test]
    fn summary_line_shows_counts() {
        let line = summary_line("out.json", &failing_result());
        assert_eq!(
            line,
            "✘ mocha out.json: 2 tests, 1 passed, 1 failed, 0 skipped  1.5s"
        );
    }

    #[test]
    fn failure_list_shows_first_error_line() {
        let text = failure_list("out.json", &failing_result());
        assert!(text.starts_with("out.json:\n"));
        assert!(text.contains("✘ math › divides  (test/math.js)"));
        assert!(text.contains("AssertionError: expected 1 to equal 2"));
        assert!(!text.contains("more"));
    }

    #[test]
    fn no_failures_prints_nothing() {
        assert_eq!(failure_list("x", &CanonicalResult::default()), "");
    }
}
