//! Adapter for `jest --json` output.
//!
//! Jest reports the describe-block path of every assertion (`ancestorTitles`),
//! so suites come from that hierarchy rather than from splitting titles.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::ExtractError;
use crate::models::{
    CanonicalResult, Coverage, EnvironmentInfo, Metadata, Summary, Test, TestError, TestStatus,
};

use super::extract::find_object;
use super::registry::Framework;
use super::suites::SuiteBuilder;
use super::text::{first_line, normalize_path, strip_ansi};
use super::timing::{NativeTime, millis, resolve_window};
use super::{ParseOptions, TestParser};

const MARKER: &str = "numTotalTests";

/// Bridge reporters nest the aggregate counters under this key.
const BRIDGE_AGGREGATE: &str = "aggregated";

/// Leading `SomethingError:` of a failure message.
static ERROR_KIND: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_$][\w$]*(?:Error|Exception))\b:?").ok());

pub struct JestParser {
    defaults: ParseOptions,
    environment: EnvironmentInfo,
}

impl JestParser {
    pub fn new(environment: EnvironmentInfo, defaults: ParseOptions) -> Self {
        Self {
            defaults,
            environment,
        }
    }
}

impl TestParser for JestParser {
    fn framework(&self) -> Framework {
        Framework::Jest
    }

    fn defaults(&self) -> &ParseOptions {
        &self.defaults
    }

    fn environment(&self) -> &EnvironmentInfo {
        &self.environment
    }

    fn decode(&self, raw: &str, options: &ParseOptions) -> Result<CanonicalResult, ExtractError> {
        let object = locate_report(raw)?;
        let coverage = object.get("coverageMap").and_then(Coverage::from_istanbul);
        let report: JestReport = serde_json::from_value(Value::Object(object))
            .map_err(|source| ExtractError::Decode {
                framework: "jest",
                source,
            })?;

        let mut builder = SuiteBuilder::new();
        let mut console = Vec::new();
        let mut runtime_errors = 0usize;
        let mut latest_end: Option<NativeTime> = None;

        for file in &report.test_results {
            let file_path = normalize_path(&file.name, options.normalize_file_paths);

            for assertion in &file.assertion_results {
                let test = build_test(assertion, &file_path);
                let suite_name = if assertion.ancestor_titles.is_empty() {
                    file_path.clone()
                } else {
                    assertion.ancestor_titles.join(" ")
                };
                builder.push(&suite_name, &file_path, test);
            }

            // A file that failed to load reports a message and no assertions.
            if file.assertion_results.is_empty()
                && file.status == "failed"
                && let Some(message) = [&file.message, &file.failure_message]
                    .into_iter()
                    .filter_map(|m| m.as_deref())
                    .find(|m| !m.trim().is_empty())
            {
                runtime_errors += 1;
                builder.push(&file_path, &file_path, suite_failure(&file_path, message));
            }

            if let Some(end) = file.end_time() {
                let later = match (&latest_end, end.to_utc()) {
                    (Some(current), Some(candidate)) => {
                        current.to_utc().is_none_or(|c| candidate > c)
                    }
                    (None, Some(_)) => true,
                    _ => false,
                };
                if later {
                    latest_end = Some(end.clone());
                }
            }

            if options.include_console_output {
                for entry in file.console.iter().flatten() {
                    console.push(json!({
                        "file": file_path,
                        "type": entry.type_name,
                        "message": entry.message,
                        "origin": entry.origin,
                    }));
                }
            }
        }
        let suites = builder.finish();

        let tally = Summary::tally(&suites);
        let start = report.start_time.clone();
        let (start_time, end_time) = resolve_window(start.as_ref(), latest_end.as_ref());
        let duration = match (&start, &latest_end) {
            (Some(_), Some(_)) => (end_time - start_time).num_milliseconds().max(0) as u64,
            _ => report.run_time_ms.map(|d| millis(Some(d))).unwrap_or(tally.duration),
        };

        // Native counters omit failed-to-run files; the tally already has them.
        let failed_tests = report
            .num_failed_tests
            .map_or(tally.failed_tests, |n| n.saturating_add(runtime_errors));
        let skipped_tests = match (report.num_pending_tests, report.num_todo_tests) {
            (None, None) => tally.skipped_tests,
            (pending, todo) => pending.unwrap_or(0).saturating_add(todo.unwrap_or(0)),
        };
        let summary = Summary {
            success: failed_tests == 0,
            total_tests: report
                .num_total_tests
                .map_or(tally.total_tests, |n| n.saturating_add(runtime_errors)),
            passed_tests: report.num_passed_tests.unwrap_or(tally.passed_tests),
            failed_tests,
            skipped_tests,
            duration,
            start_time,
            end_time,
        };

        let mut metadata = Metadata::new(
            Framework::Jest.as_str(),
            report.version.clone(),
            self.environment.clone(),
        );
        let mut namespace = Map::new();
        namespace.insert("numTotalTestSuites".into(), json!(report.num_total_test_suites));
        namespace.insert("numPassedTestSuites".into(), json!(report.num_passed_test_suites));
        namespace.insert("numFailedTestSuites".into(), json!(report.num_failed_test_suites));
        namespace.insert(
            "numRuntimeErrorTestSuites".into(),
            json!(report.num_runtime_error_test_suites),
        );
        namespace.insert("numTodoTests".into(), json!(report.num_todo_tests));
        namespace.insert("success".into(), json!(report.success));
        namespace.insert("wasInterrupted".into(), json!(report.was_interrupted));
        if options.include_console_output && !console.is_empty() {
            namespace.insert("console".into(), Value::Array(console));
        }
        metadata.insert_namespace(Framework::Jest.as_str(), Value::Object(namespace));

        Ok(CanonicalResult {
            summary,
            test_suites: suites,
            coverage,
            metadata,
        })
    }
}

/// The report object: stock `--json` output carries the counters at top
/// level, the bridge format nests them under `aggregated` next to
/// `testResults`. Bridge counters are lifted so both decode the same way.
fn locate_report(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    match find_object(raw, "jest", BRIDGE_AGGREGATE) {
        Ok(mut object) if object.get(BRIDGE_AGGREGATE).is_some_and(Value::is_object) => {
            if let Some(Value::Object(aggregated)) = object.remove(BRIDGE_AGGREGATE) {
                for (key, value) in aggregated {
                    object.entry(key).or_insert(value);
                }
            }
            Ok(object)
        }
        Ok(_) | Err(ExtractError::NoPayload { .. }) => find_object(raw, "jest", MARKER),
        Err(err) => Err(err),
    }
}

fn build_test(assertion: &JestAssertion, file_path: &str) -> Test {
    let full_name = if assertion.full_name.is_empty() {
        assertion
            .ancestor_titles
            .iter()
            .chain(std::iter::once(&assertion.title))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        assertion.full_name.clone()
    };

    let mut status = TestStatus::from_native(&assertion.status);
    if assertion.timed_out == Some(true)
        || (status == TestStatus::Failed
            && assertion
                .failure_messages
                .iter()
                .any(|m| m.contains("Exceeded timeout of")))
    {
        status = TestStatus::TimedOut;
    }

    let error = status.is_failure().then(|| build_error(assertion));

    Test {
        id: format!("{} {}", file_path, full_name),
        name: assertion.title.clone(),
        full_name,
        status,
        duration: millis(assertion.duration),
        file_path: Some(file_path.to_string()),
        error,
    }
}

fn build_error(assertion: &JestAssertion) -> TestError {
    let messages: Vec<String> = assertion
        .failure_messages
        .iter()
        .map(|m| strip_ansi(m))
        .collect();
    let message = messages.first().map(|m| first_line(m)).unwrap_or("").to_string();
    let kind = error_kind(&message);

    let matcher = assertion
        .failure_details
        .iter()
        .flatten()
        .find_map(|d| d.get("matcherResult"));

    TestError {
        message,
        stack: messages.join("\n"),
        kind,
        diff: None,
        actual: matcher.and_then(|m| m.get("actual")).cloned(),
        expected: matcher.and_then(|m| m.get("expected")).cloned(),
    }
}

fn suite_failure(file_path: &str, message: &str) -> Test {
    let clean = strip_ansi(message);
    let first = first_line(&clean).to_string();
    let name = "Test suite failed to run".to_string();
    Test {
        id: format!("{} {}", file_path, name),
        full_name: format!("{} {}", file_path, name),
        name,
        status: TestStatus::Failed,
        duration: 0,
        file_path: Some(file_path.to_string()),
        error: Some(TestError {
            kind: error_kind(&first),
            message: first,
            stack: clean,
            ..TestError::default()
        }),
    }
}

fn error_kind(message: &str) -> String {
    ERROR_KIND
        .as_ref()
        .and_then(|re| re.captures(message))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "Error".to_string())
}

// --- `--json` deserialization types ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JestReport {
    num_total_tests: Option<usize>,
    num_passed_tests: Option<usize>,
    num_failed_tests: Option<usize>,
    num_pending_tests: Option<usize>,
    num_todo_tests: Option<usize>,
    num_total_test_suites: Option<usize>,
    num_passed_test_suites: Option<usize>,
    num_failed_test_suites: Option<usize>,
    num_runtime_error_test_suites: Option<usize>,
    start_time: Option<NativeTime>,
    run_time_ms: Option<f64>,
    success: Option<bool>,
    was_interrupted: Option<bool>,
    version: Option<String>,
    test_results: Vec<JestFileResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JestFileResult {
    #[serde(alias = "testFilePath")]
    name: String,
    status: String,
    message: Option<String>,
    failure_message: Option<String>,
    end_time: Option<NativeTime>,
    perf_stats: Option<JestPerfStats>,
    console: Option<Vec<JestConsoleEntry>>,
    #[serde(alias = "testResults")]
    assertion_results: Vec<JestAssertion>,
}

impl JestFileResult {
    fn end_time(&self) -> Option<&NativeTime> {
        self.perf_stats
            .as_ref()
            .and_then(|p| p.end.as_ref())
            .or(self.end_time.as_ref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JestPerfStats {
    end: Option<NativeTime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JestConsoleEntry {
    message: Option<Value>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JestAssertion {
    ancestor_titles: Vec<String>,
    title: String,
    full_name: String,
    status: String,
    timed_out: Option<bool>,
    duration: Option<f64>,
    failure_messages: Vec<String>,
    failure_details: Option<Vec<Value>>,
}
