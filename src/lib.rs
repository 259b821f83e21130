//! Parse three-field comma-separated log lines, filter by one metric name
//! and aggregate the values. Two swappable parsing strategies, a sequential
//! and a chunked parallel scan, plus the surrounding tooling: a conforming
//! log generator and a child-process resource sampler that feeds the same
//! aggregation contract.

pub mod aggregate;
pub mod error;
pub mod extract;
pub mod generate;
#[cfg(target_os = "linux")]
pub mod measure;
pub mod parse;
pub mod pipeline;
pub mod source;
pub mod table;

pub use error::Error;

pub const DEFAULT_METRIC: &str = "cpu_usage";
