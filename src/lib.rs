//! Normalizes test-framework reports into one canonical result schema.
//!
//! ```ignore
//! let registry = ParserRegistry::new(EnvironmentInfo::current(), ParseOptions::default());
//! let parser = registry.select(&raw, None).unwrap();
//! let result = parser.parse(&raw, &ParseOverrides::default());
//! for failed in parser.failed_tests(&result) {
//!     println!("{} › {}", failed.suite_name, failed.test.name);
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod report;

pub use config::Config;
pub use error::{ConfigError, ExtractError, UnknownFramework};
pub use models::{
    CanonicalResult, Coverage, EnvironmentInfo, LocatedTest, Metadata, Suite, SuiteStatus,
    Summary, Test, TestError, TestStatus,
};
pub use parser::{
    Framework, JestParser, MochaParser, ParseOptions, ParseOverrides, ParserRegistry, TestParser,
    VitestParser,
};
