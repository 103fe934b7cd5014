use std::collections::HashMap;

use crate::models::{Suite, SuiteStatus, Test};

/// Name given to tests that sit outside any describe block and have no file.
pub const ROOT_SUITE: &str = "(root)";

/// Groups tests into suites, preserving first-seen order.
#[derive(Debug, Default)]
pub struct SuiteBuilder {
    suites: Vec<Suite>,
    index: HashMap<(String, String), usize>,
}

impl SuiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `test` to the suite identified by (`name`, `file_path`), creating it
    /// on first use. Duration and status roll up as tests arrive.
    pub fn push(&mut self, name: &str, file_path: &str, test: Test) {
        let key = (name.to_string(), file_path.to_string());
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.suites.push(Suite {
                    name: name.to_string(),
                    file_path: file_path.to_string(),
                    ..Suite::default()
                });
                self.index.insert(key, self.suites.len() - 1);
                self.suites.len() - 1
            }
        };

        let suite = &mut self.suites[idx];
        suite.duration = suite.duration.saturating_add(test.duration);
        suite.status.absorb(test.status);
        suite.tests.push(test);
    }

    /// Replace the test with the same id in its suite, or push it if new.
    /// Suite duration and status are recomputed for the touched suite.
    pub fn upsert(&mut self, name: &str, file_path: &str, test: Test) {
        let key = (name.to_string(), file_path.to_string());
        let Some(&idx) = self.index.get(&key) else {
            self.push(name, file_path, test);
            return;
        };
        let suite = &mut self.suites[idx];
        match suite.tests.iter_mut().find(|t| t.id == test.id) {
            Some(existing) => *existing = test,
            None => suite.tests.push(test),
        }
        suite.duration = suite
            .tests
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.duration));
        suite.status = SuiteStatus::Passed;
        for t in &suite.tests {
            suite.status.absorb(t.status);
        }
    }

    pub fn find(&self, name: &str, file_path: &str, id: &str) -> Option<&Test> {
        let idx = *self.index.get(&(name.to_string(), file_path.to_string()))?;
        self.suites[idx].tests.iter().find(|t| t.id == id)
    }

    pub fn finish(self) -> Vec<Suite> {
        self.suites
    }
}

/// Split a fully-qualified title into (suite name, test name) by treating the
/// last whitespace-delimited token as the test name.
///
/// Best-effort fallback for reporters that give no suite hierarchy: a test
/// title containing spaces ("adds two numbers") is split in the wrong place.
/// Adapters with native describe-block data must use that instead.
pub fn split_qualified_title(full_title: &str) -> (&str, &str) {
    let full_title = full_title.trim();
    match full_title.rsplit_once(char::is_whitespace) {
        Some((suite, test)) => (suite.trim_end(), test),
        None => ("", full_title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestStatus;

    fn test(id: &str, status: TestStatus, duration: u64) -> Test {
        Test {
            id: id.into(),
            name: id.into(),
            full_name: id.into(),
            status,
            duration,
            ..Test::default()
        }
    }

    #[test]
    fn splits_on_last_token() {
        assert_eq!(split_qualified_title("Suite Foo bar works"), ("Suite Foo bar", "works"));
        assert_eq!(split_qualified_title("lonely"), ("", "lonely"));
        assert_eq!(split_qualified_title("  a   b  "), ("a", "b"));
    }

    #[test]
    fn groups_in_first_seen_order() {
        let mut builder = SuiteBuilder::new();
        builder.push("B", "b.js", test("b1", TestStatus::Passed, 3));
        builder.push("A", "a.js", test("a1", TestStatus::Failed, 4));
        builder.push("B", "b.js", test("b2", TestStatus::Skipped, 5));

        let suites = builder.finish();
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].name, "B");
        assert_eq!(suites[0].duration, 8);
        assert_eq!(suites[0].status, SuiteStatus::Passed);
        assert_eq!(suites[1].status, SuiteStatus::Failed);
    }

    #[test]
    fn upsert_replaces_and_recomputes() {
        let mut builder = SuiteBuilder::new();
        builder.push("S", "s.js", test("t", TestStatus::Failed, 10));
        builder.upsert("S", "s.js", test("t", TestStatus::Passed, 2));

        assert_eq!(builder.find("S", "s.js", "t").unwrap().status, TestStatus::Passed);
        let suites = builder.finish();
        assert_eq!(suites[0].tests.len(), 1);
        assert_eq!(suites[0].duration, 2);
        assert_eq!(suites[0].status, SuiteStatus::Passed);
    }
}
