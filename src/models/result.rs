use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coverage::Coverage;
use super::status::{SuiteStatus, TestStatus};

/// Bumped whenever a wire field or status spelling changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Keys reserved by the canonical metadata; framework namespaces may not use them.
pub const CANONICAL_METADATA_KEYS: &[&str] = &[
    "framework",
    "version",
    "schemaVersion",
    "environment",
    "parseError",
    "rawOutput",
];

/// Root value produced by every parser.
///
/// Every field defaults when absent so that a result read back from JSON is
/// always queryable, even if a producer left parts out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalResult {
    pub summary: Summary,
    pub test_suites: Vec<Suite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
    pub metadata: Metadata,
}

impl CanonicalResult {
    /// Iterate every test of every suite in discovery order.
    pub fn tests(&self) -> impl Iterator<Item = (&Suite, &Test)> {
        self.test_suites
            .iter()
            .flat_map(|suite| suite.tests.iter().map(move |test| (suite, test)))
    }

    pub fn is_parse_error(&self) -> bool {
        self.metadata.parse_error
    }
}

/// Aggregate counts for a run. The default value is the zeroed, failed summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Summary {
    pub success: bool,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub skipped_tests: usize,
    /// Milliseconds.
    pub duration: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Summary {
    /// Tally counts from already-built suites, used when the framework does not
    /// report its own aggregate.
    pub fn tally(suites: &[Suite]) -> Self {
        let mut summary = Summary::default();
        for test in suites.iter().flat_map(|s| s.tests.iter()) {
            summary.total_tests += 1;
            if test.status.is_failure() {
                summary.failed_tests += 1;
            } else if test.status.is_skipped() {
                summary.skipped_tests += 1;
            } else {
                summary.passed_tests += 1;
            }
            summary.duration = summary.duration.saturating_add(test.duration);
        }
        summary.success = summary.failed_tests == 0;
        summary
    }
}

/// One test file or logical grouping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Suite {
    pub name: String,
    pub file_path: String,
    /// Sum of member test durations, in milliseconds.
    pub duration: u64,
    pub status: SuiteStatus,
    pub tests: Vec<Test>,
}

/// One leaf test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Test {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub status: TestStatus,
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TestError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestError {
    pub message: String,
    pub stack: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl Default for TestError {
    fn default() -> Self {
        Self {
            message: String::new(),
            stack: String::new(),
            kind: "Error".to_string(),
            diff: None,
            actual: None,
            expected: None,
        }
    }
}

/// Describes the host that did the parsing, not the system under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentInfo {
    pub runtime: String,
    pub platform: String,
    pub arch: String,
}

impl EnvironmentInfo {
    /// Describe the current process. Parsers never call this themselves.
    pub fn current() -> Self {
        Self {
            runtime: format!("testnorm {}", env!("CARGO_PKG_VERSION")),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub framework: String,
    pub version: String,
    pub schema_version: u32,
    pub environment: EnvironmentInfo,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub parse_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    /// Framework-namespaced extension data, keyed by framework name. Only
    /// reachable through `insert_namespace`, which keeps canonical keys out.
    #[serde(flatten)]
    namespaces: BTreeMap<String, Value>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            framework: String::new(),
            version: "unknown".to_string(),
            schema_version: SCHEMA_VERSION,
            environment: EnvironmentInfo::default(),
            parse_error: false,
            raw_output: None,
            namespaces: BTreeMap::new(),
        }
    }
}

impl Metadata {
    pub fn new(framework: &str, version: Option<String>, environment: EnvironmentInfo) -> Self {
        Self {
            framework: framework.to_string(),
            version: version
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            environment,
            ..Self::default()
        }
    }

    /// Attach framework-specific data. Returns false (and stores nothing) when
    /// `key` would shadow a canonical field.
    pub fn insert_namespace(&mut self, key: &str, value: Value) -> bool {
        if CANONICAL_METADATA_KEYS.contains(&key) {
            tracing::warn!(key, "refusing framework namespace that shadows a canonical metadata key");
            return false;
        }
        self.namespaces.insert(key.to_string(), value);
        true
    }

    pub fn namespace(&self, key: &str) -> Option<&Value> {
        self.namespaces.get(key)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.namespaces.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A test annotated with the suite that owns it, as returned by the query accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatedTest {
    #[serde(flatten)]
    pub test: Test,
    pub suite_name: String,
    /// The test's own file path, else the owning suite's.
    pub file_path: String,
}

impl LocatedTest {
    pub fn new(suite: &Suite, test: &Test) -> Self {
        let mut test = test.clone();
        let file_path = test
            .file_path
            .take()
            .unwrap_or_else(|| suite.file_path.clone());
        Self {
            test,
            suite_name: suite.name.clone(),
            file_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_read_as_defaults() {
        let result: CanonicalResult = serde_json::from_str("{}").unwrap();
        assert!(!result.summary.success);
        assert_eq!(result.summary.total_tests, 0);
        assert!(result.test_suites.is_empty());
        assert_eq!(result.metadata.version, "unknown");
    }

    #[test]
    fn error_type_defaults_to_error() {
        let err: TestError = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();
        assert_eq!(err.kind, "Error");
        assert_eq!(err.stack, "");
    }

    #[test]
    fn namespace_cannot_shadow_canonical_key() {
        let mut meta = Metadata::new("mocha", None, EnvironmentInfo::default());
        assert!(!meta.insert_namespace("framework", Value::Bool(true)));
        assert!(meta.insert_namespace("mocha", serde_json::json!({"stats": {}})));

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["framework"], "mocha");
        assert_eq!(json["mocha"]["stats"], serde_json::json!({}));
        assert!(json.get("parseError").is_none());
    }

    #[test]
    fn blank_version_becomes_unknown() {
        let meta = Metadata::new("jest", Some("  ".into()), EnvironmentInfo::default());
        assert_eq!(meta.version, "unknown");
    }

    #[test]
    fn canonical_keys_never_serialize_twice() {
        let mut meta = Metadata::new("jest", Some("29.7.0".into()), EnvironmentInfo::default());
        assert!(!meta.insert_namespace("version", serde_json::json!("shadow")));
        assert!(meta.insert_namespace("jest", serde_json::json!({"success": true})));

        let text = serde_json::to_string(&meta).unwrap();
        assert_eq!(text.matches("\"version\"").count(), 1);
        assert_eq!(meta.namespaces().map(|(k, _)| k).collect::<Vec<_>>(), ["jest"]);

        let back: Metadata = serde_json::from_str(&text).unwrap();
        assert_eq!(back.version, "29.7.0");
        assert_eq!(back, meta);
    }

    #[test]
    fn tally_counts_failure_classes() {
        let test = |status| Test {
            status,
            duration: 5,
            ..Test::default()
        };
        let suite = Suite {
            tests: vec![
                test(TestStatus::Passed),
                test(TestStatus::TimedOut),
                test(TestStatus::Todo),
                test(TestStatus::Skipped),
            ],
            ..Suite::default()
        };
        let summary = Summary::tally(&[suite]);
        assert_eq!(summary.total_tests, 4);
        assert_eq!(summary.passed_tests, 1);
        assert_eq!(summary.failed_tests, 1);
        assert_eq!(summary.skipped_tests, 2);
        assert_eq!(summary.duration, 20);
        assert!(!summary.success);
    }
}
