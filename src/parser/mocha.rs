//! Adapter for Mocha's built-in `json` reporter.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ExtractError;
use crate::models::{
    CanonicalResult, EnvironmentInfo, Metadata, Summary, Test, TestError, TestStatus,
};

use super::extract::find_object;
use super::registry::Framework;
use super::suites::{ROOT_SUITE, SuiteBuilder, split_qualified_title};
use super::text::normalize_path;
use super::timing::{NativeTime, millis, resolve_window};
use super::{ParseOptions, TestParser};

const MARKER: &str = "stats";

pub struct MochaParser {
    defaults: ParseOptions,
    environment: EnvironmentInfo,
}

impl MochaParser {
    pub fn new(environment: EnvironmentInfo, defaults: ParseOptions) -> Self {
        Self {
            defaults,
            environment,
        }
    }

    fn build_test(&self, native: &MochaTest, status: TestStatus, options: &ParseOptions) -> Test {
        let full_name = if native.full_title.is_empty() {
            native.title.clone()
        } else {
            native.full_title.clone()
        };

        let error = if status == TestStatus::Failed {
            let err = native.err.clone().unwrap_or_default();
            Some(TestError {
                message: err.message.unwrap_or_default(),
                stack: err.stack.unwrap_or_default(),
                kind: err.name.unwrap_or_else(|| "Error".to_string()),
                diff: err.diff,
                actual: err.actual,
                expected: err.expected,
            })
        } else {
            None
        };

        Test {
            id: full_name.clone(),
            name: native.title.clone(),
            full_name,
            status,
            duration: millis(native.duration),
            file_path: native
                .file
                .as_deref()
                .map(|f| normalize_path(f, options.normalize_file_paths)),
            error,
        }
    }
}

impl TestParser for MochaParser {
    fn framework(&self) -> Framework {
        Framework::Mocha
    }

    fn defaults(&self) -> &ParseOptions {
        &self.defaults
    }

    fn environment(&self) -> &EnvironmentInfo {
        &self.environment
    }

    fn decode(&self, raw: &str, options: &ParseOptions) -> Result<CanonicalResult, ExtractError> {
        let object = find_object(raw, "mocha", MARKER)?;
        let raw_stats = object.get(MARKER).cloned().unwrap_or(Value::Null);
        let report: MochaReport = serde_json::from_value(Value::Object(object))
            .map_err(|source| ExtractError::Decode {
                framework: "mocha",
                source,
            })?;

        let mut builder = SuiteBuilder::new();
        let collections = [
            (&report.passes, TestStatus::Passed),
            (&report.failures, TestStatus::Failed),
            (&report.pending, TestStatus::Skipped),
        ];
        for (natives, status) in collections {
            for native in natives {
                let mut test = self.build_test(native, status, options);
                // Mocha's JSON reporter flattens the describe tree into
                // `fullTitle`, so the suite is guessed from the title.
                let (suite_name, short) = split_qualified_title(&test.full_name);
                if test.name.is_empty() {
                    test.name = short.to_string();
                }
                let file_path = test.file_path.clone().unwrap_or_default();
                let suite_name = match suite_name {
                    "" if !file_path.is_empty() => file_path.clone(),
                    "" => ROOT_SUITE.to_string(),
                    name => name.to_string(),
                };
                builder.push(&suite_name, &file_path, test);
            }
        }
        let suites = builder.finish();

        let tally = Summary::tally(&suites);
        let stats = report.stats.unwrap_or_default();
        let (start_time, end_time) = resolve_window(stats.start.as_ref(), stats.end.as_ref());
        let failed_tests = stats.failures.unwrap_or(tally.failed_tests);
        let summary = Summary {
            success: failed_tests == 0,
            total_tests: stats.tests.unwrap_or(tally.total_tests),
            passed_tests: stats.passes.unwrap_or(tally.passed_tests),
            failed_tests,
            skipped_tests: stats.pending.unwrap_or(tally.skipped_tests),
            duration: stats.duration.map(|d| millis(Some(d))).unwrap_or(tally.duration),
            start_time,
            end_time,
        };

        let mut metadata = Metadata::new(
            Framework::Mocha.as_str(),
            report.version,
            self.environment.clone(),
        );
        let mut namespace = Map::new();
        namespace.insert("stats".to_string(), raw_stats);
        metadata.insert_namespace(Framework::Mocha.as_str(), Value::Object(namespace));

        Ok(CanonicalResult {
            summary,
            test_suites: suites,
            coverage: None,
            metadata,
        })
    }
}

// --- JSON reporter deserialization types ---

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MochaReport {
    stats: Option<MochaStats>,
    passes: Vec<MochaTest>,
    failures: Vec<MochaTest>,
    pending: Vec<MochaTest>,
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MochaStats {
    tests: Option<usize>,
    passes: Option<usize>,
    pending: Option<usize>,
    failures: Option<usize>,
    start: Option<NativeTime>,
    end: Option<NativeTime>,
    duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MochaTest {
    title: String,
    full_title: String,
    file: Option<String>,
    duration: Option<f64>,
    err: Option<MochaError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MochaError {
    message: Option<String>,
    stack: Option<String>,
    name: Option<String>,
    diff: Option<String>,
    actual: Option<Value>,
    expected: Option<Value>,
}
