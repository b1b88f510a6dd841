//! Per-file statistics for space-delimited access logs.
//!
//! [`collect::collect`] expands the inputs and runs a [`aggregate::FileAggregator`] over each
//! file. Each file's [`aggregate::FileStats`] is projected into a [`report::ReportEntry`].

pub mod aggregate;
pub mod collect;
pub mod error;
pub mod parser;
pub mod report;

pub use aggregate::{AggregatorConfig, FileAggregator, FileStats, Metrics};
pub use collect::{collect, BatchOutcome};
pub use report::{write_report, Report, ReportEntry};
