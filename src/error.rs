use std::{io, path::PathBuf, str::Utf8Error};

use thiserror::Error;

/// A line that could not be turned into a [`crate::parser::LogLine`]. The line is skipped.
#[derive(Error, Debug)]
pub enum LineError {
    #[error("expected at least {expected} fields, found {found}")]
    MalformedLine { expected: usize, found: usize },
    #[error("invalid UTF-8: {0}")]
    Encoding(#[from] Utf8Error),
}

/// A single field of an otherwise valid line that did not parse.
/// Only that field's contribution is skipped.
#[derive(Error, Debug, PartialEq)]
pub enum FieldError {
    #[error("bad values {header:?} {response:?} for bytes exchanged")]
    ByteParse { header: String, response: String },
    #[error("bad timestamp {0:?}")]
    TimestampParse(String),
}

/// Why events-per-second is unavailable for a file.
#[derive(Error, Debug, PartialEq)]
pub enum MetricError {
    #[error("start and end timestamps are both {0}, rate is undefined")]
    DivisionByZero(f64),
    #[error("end time {end} is before start time {start}")]
    TimeOrder { start: f64, end: f64 },
    #[error("no timestamps recorded")]
    NoTimestamps,
}

/// Failure that drops a whole input from the report.
#[derive(Error, Debug)]
pub enum FileAccessError {
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot read {path} at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        source: io::Error,
    },
    #[error("cannot list directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: walkdir::Error,
    },
}
