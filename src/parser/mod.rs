pub mod extract;
pub mod fallback;
pub mod jest;
pub mod mocha;
pub mod query;
pub mod registry;
pub mod suites;
pub mod text;
pub mod timing;
pub mod vitest;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::models::{CanonicalResult, EnvironmentInfo, LocatedTest, Summary, Test, TestError};

pub use jest::JestParser;
pub use mocha::MochaParser;
pub use registry::{Framework, ParserRegistry};
pub use vitest::VitestParser;

/// Effective options for one `parse()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Rewrite `\` path separators to `/`.
    pub normalize_file_paths: bool,
    /// Keep framework console capture under the framework's metadata namespace.
    pub include_console_output: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            normalize_file_paths: true,
            include_console_output: true,
        }
    }
}

/// Per-call or per-config overrides; unset fields fall through to the parser's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOverrides {
    pub normalize_file_paths: Option<bool>,
    pub include_console_output: Option<bool>,
}

impl ParseOverrides {
    pub fn apply(&self, defaults: &ParseOptions) -> ParseOptions {
        ParseOptions {
            normalize_file_paths: self
                .normalize_file_paths
                .unwrap_or(defaults.normalize_file_paths),
            include_console_output: self
                .include_console_output
                .unwrap_or(defaults.include_console_output),
        }
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ParseOverrides) -> ParseOverrides {
        ParseOverrides {
            normalize_file_paths: other.normalize_file_paths.or(self.normalize_file_paths),
            include_console_output: other.include_console_output.or(self.include_console_output),
        }
    }
}

/// Capability contract shared by every framework adapter.
///
/// Consumers hold `&dyn TestParser` (usually from [`ParserRegistry`]) and never
/// need the concrete adapter type. Only `decode` is framework-specific; the
/// no-throw `parse` and all query accessors are provided.
pub trait TestParser: Send + Sync {
    fn framework(&self) -> Framework;

    /// Constructor-level defaults, overridden per call by [`ParseOverrides`].
    fn defaults(&self) -> &ParseOptions;

    /// Descriptor of the parsing host, injected at construction.
    fn environment(&self) -> &EnvironmentInfo;

    /// Decode raw framework output with already-merged options.
    fn decode(&self, raw: &str, options: &ParseOptions) -> Result<CanonicalResult, ExtractError>;

    /// Parse raw framework output. Never fails: unrecognizable input yields a
    /// ParseError result with `metadata.parseError == true`.
    fn parse(&self, raw: &str, overrides: &ParseOverrides) -> CanonicalResult {
        let options = overrides.apply(self.defaults());
        match self.decode(raw, &options) {
            Ok(result) => {
                tracing::debug!(
                    framework = %self.framework(),
                    suites = result.test_suites.len(),
                    total = result.summary.total_tests,
                    failed = result.summary.failed_tests,
                    "parsed test report"
                );
                result
            }
            Err(err) => {
                tracing::warn!(framework = %self.framework(), error = %err, "falling back to parse-error result");
                fallback::parse_error_result(self.framework(), self.environment(), raw, &err)
            }
        }
    }

    fn failed_tests(&self, result: &CanonicalResult) -> Vec<LocatedTest> {
        query::failed_tests(result)
    }

    fn passed_tests(&self, result: &CanonicalResult) -> Vec<LocatedTest> {
        query::passed_tests(result)
    }

    fn skipped_tests(&self, result: &CanonicalResult) -> Vec<LocatedTest> {
        query::skipped_tests(result)
    }

    fn summary(&self, result: &CanonicalResult) -> Summary {
        query::summary(result)
    }

    fn is_successful(&self, result: &CanonicalResult) -> bool {
        query::is_successful(result)
    }

    fn error_details(&self, test: &Test) -> Option<TestError> {
        query::error_details(test)
    }

    fn test_file_path(&self, test: &Test) -> String {
        query::test_file_path(test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_time_overrides_win() {
        let defaults = ParseOptions {
            normalize_file_paths: false,
            include_console_output: true,
        };
        let overrides = ParseOverrides {
            normalize_file_paths: Some(true),
            include_console_output: None,
        };
        assert_eq!(
            overrides.apply(&defaults),
            ParseOptions {
                normalize_file_paths: true,
                include_console_output: true,
            }
        );
    }

    #[test]
    fn merge_prefers_later_layer() {
        let config = ParseOverrides {
            normalize_file_paths: Some(false),
            include_console_output: Some(false),
        };
        let cli = ParseOverrides {
            include_console_output: Some(true),
            ..ParseOverrides::default()
        };
        let merged = config.merge(cli);
        assert_eq!(merged.normalize_file_paths, Some(false));
        assert_eq!(merged.include_console_output, Some(true));
    }
}
