pub mod coverage;
pub mod result;
pub mod status;

pub use coverage::{Coverage, CoverageMetric};
pub use result::{
    CANONICAL_METADATA_KEYS, CanonicalResult, EnvironmentInfo, LocatedTest, Metadata,
    SCHEMA_VERSION, Suite, Summary, Test, TestError,
};
pub use status::{SuiteStatus, TestStatus};
