use pretty_assertions::assert_eq;

use testnorm::parser::fallback::{PARSE_ERROR_SUITE, PARSE_ERROR_TEST_ID, PARSE_ERROR_TYPE};
use testnorm::{
    EnvironmentInfo, Framework, MochaParser, ParseOptions, ParseOverrides, ParserRegistry,
    Summary, TestParser,
};

fn mocha() -> MochaParser {
    MochaParser::new(EnvironmentInfo::default(), ParseOptions::default())
}

#[test]
fn garbage_input_becomes_parse_error_result() {
    let parser = mocha();
    let result = parser.parse("not json at all", &ParseOverrides::default());

    assert!(result.metadata.parse_error);
    assert_eq!(result.summary.failed_tests, 1);
    assert!(!parser.is_successful(&result));

    let suite = &result.test_suites[0];
    assert_eq!(suite.name, PARSE_ERROR_SUITE);
    assert_eq!(suite.tests[0].id, PARSE_ERROR_TEST_ID);
    assert_eq!(suite.tests[0].error.as_ref().unwrap().kind, PARSE_ERROR_TYPE);
    assert_eq!(result.metadata.raw_output.as_deref(), Some("not json at all"));
}

#[test]
fn malformed_payload_becomes_parse_error_result() {
    let result = mocha().parse(r#"{"stats": {"tests": 3,}"#, &ParseOverrides::default());
    assert!(result.metadata.parse_error);
    let error = result.test_suites[0].tests[0].error.clone().unwrap();
    assert!(error.message.starts_with("Failed to parse mocha output: malformed mocha report"));
}

#[test]
fn wrongly_typed_payload_becomes_parse_error_result() {
    let result = mocha().parse(r#"{"stats": {"tests": "three"}}"#, &ParseOverrides::default());
    assert!(result.metadata.parse_error);
}

#[test]
fn every_framework_degrades_instead_of_failing() {
    let registry = ParserRegistry::new(EnvironmentInfo::default(), ParseOptions::default());
    for framework in Framework::ALL {
        let parser = registry.get(framework).unwrap();
        let result = parser.parse("", &ParseOverrides::default());
        assert!(result.metadata.parse_error, "{}", framework);
        assert_eq!(result.metadata.framework, framework.as_str());
        assert!(parser.failed_tests(&result).len() == 1);
        assert!(parser.passed_tests(&result).is_empty());
    }
}

#[test]
fn scenario_one_failure_of_three() {
    let raw = r#"{
        "stats": {"tests": 3, "passes": 2, "failures": 1, "pending": 0, "duration": 42},
        "failures": [{"title": "works", "fullTitle": "Suite Foo bar works", "err": {"message": "nope"}}]
    }"#;
    let result = mocha().parse(raw, &ParseOverrides::default());

    assert_eq!(result.test_suites.len(), 1);
    assert_eq!(result.test_suites[0].name, "Suite Foo bar");
    assert_eq!(result.test_suites[0].tests.len(), 1);
    assert_eq!(result.test_suites[0].tests[0].name, "works");

    let Summary {
        success,
        total_tests,
        passed_tests,
        failed_tests,
        skipped_tests,
        duration,
        ..
    } = result.summary;
    assert_eq!(
        (success, total_tests, passed_tests, failed_tests, skipped_tests, duration),
        (false, 3, 2, 1, 0, 42)
    );
}

#[test]
fn scenario_empty_run_is_success() {
    let result = mocha().parse(r#"{"stats": {"tests": 0}}"#, &ParseOverrides::default());
    assert!(!result.metadata.parse_error);
    assert!(result.summary.success);
    assert!(result.test_suites.is_empty());
}

#[test]
fn scenario_backslash_path_is_normalized() {
    let raw = r#"{"stats": {"tests": 1, "passes": 1}, "passes": [{"title": "t", "fullTitle": "s t", "file": "a\\b\\c.js"}]}"#;
    let parser = mocha();
    let result = parser.parse(raw, &ParseOverrides::default());
    let test = &result.test_suites[0].tests[0];
    assert_eq!(parser.test_file_path(test), "a/b/c.js");
}

#[test]
fn parsing_twice_is_structurally_equal() {
    let raw = r#"{"stats": {"tests": 1, "passes": 1, "start": 1714641300000, "end": 1714641300010},
        "passes": [{"title": "t", "fullTitle": "s t", "duration": 10}]}"#;
    let parser = mocha();
    let first = parser.parse(raw, &ParseOverrides::default());
    let second = parser.parse(raw, &ParseOverrides::default());
    assert_eq!(first, second);
}

#[test]
fn parse_error_and_real_failures_are_distinguishable() {
    let parser = mocha();
    let broken = parser.parse("???", &ParseOverrides::default());
    let failing = parser.parse(
        r#"{"stats": {"tests": 1, "failures": 1}, "failures": [{"title": "t", "fullTitle": "s t"}]}"#,
        &ParseOverrides::default(),
    );

    assert!(!parser.is_successful(&broken));
    assert!(!parser.is_successful(&failing));
    assert!(broken.is_parse_error());
    assert!(!failing.is_parse_error());
}
