use std::error::Error;

use chrono::Utc;

use crate::error::ExtractError;
use crate::models::{
    CanonicalResult, EnvironmentInfo, Metadata, Suite, SuiteStatus, Summary, Test, TestError,
    TestStatus,
};

use super::registry::Framework;
use super::text::truncate;

/// Characters of raw input kept in `metadata.rawOutput`.
pub const RAW_OUTPUT_LIMIT: usize = 1000;

pub const PARSE_ERROR_SUITE: &str = "Parse Error";
pub const PARSE_ERROR_TEST_ID: &str = "parse-error";
pub const PARSE_ERROR_TYPE: &str = "ParseError";

/// Build the degraded result returned when raw output cannot be understood:
/// one synthetic failed test, `failedTests == 1`, every other count zero.
pub fn parse_error_result(
    framework: Framework,
    environment: &EnvironmentInfo,
    raw: &str,
    err: &ExtractError,
) -> CanonicalResult {
    let message = format!("Failed to parse {} output: {}", framework, err);
    let mut stack = message.clone();
    let mut source = err.source();
    while let Some(cause) = source {
        stack.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }

    let test = Test {
        id: PARSE_ERROR_TEST_ID.to_string(),
        name: "Failed to parse test output".to_string(),
        full_name: "Failed to parse test output".to_string(),
        status: TestStatus::Failed,
        duration: 0,
        file_path: None,
        error: Some(TestError {
            message,
            stack,
            kind: PARSE_ERROR_TYPE.to_string(),
            ..TestError::default()
        }),
    };

    let now = Utc::now();
    let mut metadata = Metadata::new(framework.as_str(), None, environment.clone());
    metadata.parse_error = true;
    metadata.raw_output = Some(truncate(raw, RAW_OUTPUT_LIMIT));

    CanonicalResult {
        summary: Summary {
            success: false,
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 1,
            skipped_tests: 0,
            duration: 0,
            start_time: now,
            end_time: now,
        },
        test_suites: vec![Suite {
            name: PARSE_ERROR_SUITE.to_string(),
            file_path: String::new(),
            duration: 0,
            status: SuiteStatus::Failed,
            tests: vec![test],
        }],
        coverage: None,
        metadata,
    }
}
