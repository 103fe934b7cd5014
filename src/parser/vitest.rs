//! Adapter for the NDJSON event stream written by the Vitest reporter.
//!
//! Each line is one JSON event tagged by `type`. Lines that are not events
//! (vitest banners, stray logging) are skipped.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::ExtractError;
use crate::models::{
    CanonicalResult, EnvironmentInfo, Metadata, Summary, Test, TestError, TestStatus,
};

use super::registry::Framework;
use super::suites::SuiteBuilder;
use super::text::{normalize_path, strip_ansi};
use super::timing::{millis, resolve_window, started_before};
use super::{ParseOptions, TestParser};

/// Vitest separates the suite/test hierarchy in task names with this.
const NAME_SEPARATOR: &str = " > ";

pub struct VitestParser {
    defaults: ParseOptions,
    environment: EnvironmentInfo,
}

impl VitestParser {
    pub fn new(environment: EnvironmentInfo, defaults: ParseOptions) -> Self {
        Self {
            defaults,
            environment,
        }
    }
}

impl TestParser for VitestParser {
    fn framework(&self) -> Framework {
        Framework::Vitest
    }

    fn defaults(&self) -> &ParseOptions {
        &self.defaults
    }

    fn environment(&self) -> &EnvironmentInfo {
        &self.environment
    }

    fn decode(&self, raw: &str, options: &ParseOptions) -> Result<CanonicalResult, ExtractError> {
        let mut run = RunAccumulator::new(*options);
        let mut first_error = None;

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<VitestEvent>(line) {
                Ok(event) => run.apply(event),
                Err(err) => {
                    // Non-event output from vitest (e.g. banner) is noise, but a
                    // broken event line is worth reporting if nothing else decodes.
                    if line.starts_with('{') && line.contains("\"type\"") && first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if run.events == 0 {
            return Err(match first_error {
                Some(source) => ExtractError::Decode {
                    framework: "vitest",
                    source,
                },
                None => ExtractError::NoPayload {
                    framework: "vitest",
                    marker: "type",
                },
            });
        }

        Ok(run.finish(&self.environment))
    }
}

/// Folds the event stream into suites, the way a live run would be tracked.
struct RunAccumulator {
    options: ParseOptions,
    events: usize,
    builder: SuiteBuilder,
    version: Option<String>,
    finished: Option<RunTotals>,
    console: Vec<Value>,
}

#[derive(Debug, Clone, Copy)]
struct RunTotals {
    total: usize,
    passed: usize,
    failed: usize,
    skipped: usize,
    duration: u64,
}

impl RunAccumulator {
    fn new(options: ParseOptions) -> Self {
        Self {
            options,
            events: 0,
            builder: SuiteBuilder::new(),
            version: None,
            finished: None,
            console: Vec::new(),
        }
    }

    fn apply(&mut self, event: VitestEvent) {
        self.events += 1;
        match event {
            VitestEvent::RunStarted { version, .. } => {
                if version.is_some() {
                    self.version = version;
                }
            }
            VitestEvent::TestFinished {
                file,
                name,
                state,
                duration,
                error,
                ..
            } => {
                let file = normalize_path(&file, self.options.normalize_file_paths);
                let (suite_name, test_name) = match name.rsplit_once(NAME_SEPARATOR) {
                    Some((suite, test)) => (suite.to_string(), test.to_string()),
                    None => (file.clone(), name.clone()),
                };

                let id = format!("{} {}", file, name);
                let status = TestStatus::from_native(&state);
                // Don't overwrite a real result with "skipped" (happens with -t filtering)
                let dominated = status == TestStatus::Skipped
                    && self
                        .builder
                        .find(&suite_name, &file, &id)
                        .is_some_and(|t| matches!(t.status, TestStatus::Passed | TestStatus::Failed));
                if dominated {
                    return;
                }

                let error = status.is_failure().then(|| {
                    let e = error.unwrap_or_default();
                    TestError {
                        message: strip_ansi(&e.message.unwrap_or_default()),
                        stack: strip_ansi(&e.stack.unwrap_or_default()),
                        kind: e.name.unwrap_or_else(|| "Error".to_string()),
                        diff: e.diff.map(|s| strip_ansi(&s)),
                        actual: e.actual.map(|s| Value::String(strip_ansi(&s))),
                        expected: e.expected.map(|s| Value::String(strip_ansi(&s))),
                    }
                });

                let test = Test {
                    id,
                    name: test_name,
                    full_name: name,
                    status,
                    duration: millis(duration),
                    file_path: Some(file.clone()),
                    error,
                };
                self.builder.upsert(&suite_name, &file, test);
            }
            VitestEvent::ConsoleLog { file, content } => {
                if self.options.include_console_output {
                    let file = normalize_path(&file, self.options.normalize_file_paths);
                    self.console.push(json!({ "file": file, "content": content }));
                }
            }
            VitestEvent::RunFinished {
                total,
                passed,
                failed,
                skipped,
                duration,
            } => {
                self.finished = Some(RunTotals {
                    total,
                    passed,
                    failed,
                    skipped,
                    duration,
                });
            }
            VitestEvent::TestsCollected { .. }
            | VitestEvent::FileStarted { .. }
            | VitestEvent::TestStarted { .. }
            | VitestEvent::SuiteLocation { .. }
            | VitestEvent::FileFinished { .. } => {}
        }
    }

    fn finish(self, environment: &EnvironmentInfo) -> CanonicalResult {
        let suites = self.builder.finish();
        let tally = Summary::tally(&suites);
        let (_, end_time) = resolve_window(None, None);

        let summary = match self.finished {
            Some(totals) => Summary {
                success: totals.failed == 0,
                total_tests: totals.total,
                passed_tests: totals.passed,
                failed_tests: totals.failed,
                skipped_tests: totals.skipped,
                duration: totals.duration,
                start_time: started_before(end_time, totals.duration),
                end_time,
            },
            None => Summary {
                start_time: started_before(end_time, tally.duration),
                end_time,
                ..tally
            },
        };

        let mut metadata =
            Metadata::new(Framework::Vitest.as_str(), self.version, environment.clone());
        let mut namespace = Map::new();
        namespace.insert("events".into(), json!(self.events));
        if let Some(totals) = self.finished {
            namespace.insert(
                "runFinished".into(),
                json!({
                    "total": totals.total,
                    "passed": totals.passed,
                    "failed": totals.failed,
                    "skipped": totals.skipped,
                    "duration": totals.duration,
                }),
            );
        }
        if !self.console.is_empty() {
            namespace.insert("console".into(), Value::Array(self.console));
        }
        metadata.insert_namespace(Framework::Vitest.as_str(), Value::Object(namespace));

        CanonicalResult {
            summary,
            test_suites: suites,
            coverage: None,
            metadata,
        }
    }
}

// --- NDJSON deserialization types ---

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum VitestEvent {
    RunStarted {
        total: Option<usize>,
        version: Option<String>,
    },
    TestsCollected {
        file: String,
        count: usize,
    },
    FileStarted {
        file: String,
    },
    TestStarted {
        file: String,
        name: String,
    },
    TestFinished {
        file: String,
        name: String,
        state: String,
        duration: Option<f64>,
        error: Option<VitestError>,
        location: Option<VitestLocation>,
    },
    SuiteLocation {
        file: String,
        name: String,
        location: VitestLocation,
    },
    ConsoleLog {
        file: String,
        content: String,
    },
    FileFinished {
        file: String,
    },
    RunFinished {
        total: usize,
        passed: usize,
        failed: usize,
        skipped: usize,
        duration: u64,
    },
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct VitestLocation {
    line: u32,
    column: u32,
}

#[derive(Debug, Default, Deserialize)]
struct VitestError {
    name: Option<String>,
    message: Option<String>,
    expected: Option<String>,
    actual: Option<String>,
    diff: Option<String>,
    stack: Option<String>,
}
