use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownFramework;
use crate::models::EnvironmentInfo;

use super::{JestParser, MochaParser, ParseOptions, TestParser, VitestParser};

/// Tag identifying a supported test framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framework {
    Mocha,
    Jest,
    Vitest,
}

impl Framework {
    pub const ALL: [Framework; 3] = [Framework::Mocha, Framework::Jest, Framework::Vitest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Mocha => "mocha",
            Framework::Jest => "jest",
            Framework::Vitest => "vitest",
        }
    }

    /// Guess the framework from marker fields in raw output.
    pub fn sniff(raw: &str) -> Option<Framework> {
        if raw.contains("\"numTotalTests\"") {
            return Some(Framework::Jest);
        }
        let vitest_event = raw.lines().any(|line| {
            let line = line.trim_start();
            line.starts_with('{')
                && (line.contains(r#""type":"run-"#)
                    || line.contains(r#""type":"test-finished""#))
        });
        if vitest_event {
            return Some(Framework::Vitest);
        }
        if raw.contains("\"stats\"") {
            return Some(Framework::Mocha);
        }
        None
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = UnknownFramework;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Framework::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFramework(s.to_string()))
    }
}

/// Selects a parser by framework tag.
pub struct ParserRegistry {
    parsers: HashMap<Framework, Box<dyn TestParser>>,
}

impl ParserRegistry {
    /// Registry holding every built-in adapter, all sharing `environment` and `defaults`.
    pub fn new(environment: EnvironmentInfo, defaults: ParseOptions) -> Self {
        let mut registry = Self::empty();
        registry.register(MochaParser::new(environment.clone(), defaults));
        registry.register(JestParser::new(environment.clone(), defaults));
        registry.register(VitestParser::new(environment, defaults));
        registry
    }

    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Add a parser, replacing any existing one for the same framework.
    pub fn register(&mut self, parser: impl TestParser + 'static) {
        self.parsers.insert(parser.framework(), Box::new(parser));
    }

    pub fn get(&self, framework: Framework) -> Option<&dyn TestParser> {
        self.parsers.get(&framework).map(|p| &**p)
    }

    /// Pick a parser for `raw`: the declared framework, else a sniffed one,
    /// else Mocha, whose ParseError result then describes the unknown input.
    pub fn select(&self, raw: &str, declared: Option<Framework>) -> Option<&dyn TestParser> {
        let framework = declared
            .or_else(|| Framework::sniff(raw))
            .unwrap_or(Framework::Mocha);
        tracing::debug!(%framework, declared = declared.is_some(), "selected parser");
        self.get(framework)
    }

    pub fn frameworks(&self) -> Vec<Framework> {
        let mut frameworks: Vec<_> = self.parsers.keys().copied().collect();
        frameworks.sort_by_key(|f| f.as_str());
        frameworks
    }
}
