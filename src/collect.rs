use std::path::{Path, PathBuf};

use crate::{
    aggregate::FileAggregator,
    error::FileAccessError,
    report::{Report, ReportEntry},
};

/// The report could not be written.
pub const EXIT_FATAL: u8 = 1;
/// Some inputs were left out of an otherwise written report.
pub const EXIT_PARTIAL: u8 = 2;

/// An input that did not make it into the report.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: FileAccessError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub report: Report,
    pub failures: Vec<FileFailure>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Process exit status once the report is written.
    pub fn exit_code(&self) -> u8 {
        if self.is_complete() {
            0
        } else {
            EXIT_PARTIAL
        }
    }
}

/// `*.log` files directly inside `dir`, sorted by name.
pub fn discover_logs(dir: &Path) -> Result<Vec<PathBuf>, FileAccessError> {
    let mut res = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| FileAccessError::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;
        // dirs named `foo.log` are not logs, and `*.log` does not match dotfiles
        if entry.file_type().is_dir() || is_hidden(&entry) {
            continue;
        }
        if entry.path().extension().map_or(false, |ext| ext == "log") {
            res.push(entry.into_path());
        }
    }
    Ok(res)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(false, |s| s.starts_with('.'))
}

/// Expand directories, then aggregate every file in order.
/// Failures are logged and recorded, never returned early.
pub fn collect<P: AsRef<Path>>(inputs: &[P], aggregator: &FileAggregator) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            match discover_logs(input) {
                Ok(found) => {
                    tracing::debug!("{} contains {} log files", input.display(), found.len());
                    files.extend(found);
                }
                Err(error) => {
                    tracing::error!("{}", error);
                    outcome.failures.push(FileFailure {
                        path: input.to_path_buf(),
                        error,
                    });
                }
            }
        } else {
            files.push(input.to_path_buf());
        }
    }
    tracing::debug!("Files: {:?}", files);

    let metrics = aggregator.metrics();
    for path in files {
        match aggregator.process_file(&path) {
            Ok(stats) => {
                if stats.line_count == 0 {
                    tracing::warn!("No valid lines in {}", path.display());
                }
                outcome.report.push(ReportEntry::from_stats(&stats, metrics));
            }
            Err(error) => {
                tracing::error!("Skipping file: {}", error);
                outcome.failures.push(FileFailure { path, error });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregatorConfig, Metrics};
    use std::fs;
    use test_log::test;

    const LOG: &str = "header\n\
        0 100 10.0.0.1 TCP_MISS/200 50 GET http://a/ - DIRECT/1.1.1.1 text/html\n\
        5 100 10.0.0.2 TCP_MISS/200 50 GET http://a/ - DIRECT/1.1.1.1 text/html\n\
        10 100 10.0.0.1 TCP_MISS/200 50 GET http://a/ - DIRECT/1.1.1.1 text/html\n";

    fn aggregator(metrics: Metrics) -> FileAggregator {
        FileAggregator::new(metrics, AggregatorConfig::default())
    }

    #[test]
    fn test_directory_expansion() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.log"), LOG).unwrap();
        fs::write(dir.path().join("a.log"), LOG).unwrap();
        fs::write(dir.path().join("c.txt"), LOG).unwrap();
        fs::create_dir(dir.path().join("d.log")).unwrap();
        fs::write(dir.path().join("d.log").join("nested.log"), LOG).unwrap();

        let outcome = collect(&[dir.path()], &aggregator(Metrics::all()));
        assert!(outcome.is_complete());
        let files: Vec<_> = outcome.report.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, ["a.log", "b.log"]);
        assert_eq!(outcome.report[0].most_frequent_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(outcome.report[0].least_frequent_ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(outcome.report[0].events_per_second, Some(0.3));
        assert_eq!(outcome.report[0].total_bytes_exchanged, Some(450));
    }

    #[test]
    fn test_hidden_logs_are_not_discovered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.log"), LOG).unwrap();
        fs::write(dir.path().join(".hidden.log"), LOG).unwrap();
        fs::write(dir.path().join(".log"), LOG).unwrap();

        let found = discover_logs(dir.path()).unwrap();
        assert_eq!(found, vec![dir.path().join("a.log")]);
    }

    #[test]
    fn test_missing_file_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.log");
        let missing = dir.path().join("missing.log");
        let last = dir.path().join("last.log");
        fs::write(&first, LOG).unwrap();
        fs::write(&last, LOG).unwrap();

        let outcome = collect(&[&first, &missing, &last], &aggregator(Metrics::all()));
        let files: Vec<_> = outcome.report.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, ["first.log", "last.log"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].path, missing);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.exit_code(), EXIT_PARTIAL);
    }

    #[test]
    fn test_explicit_files_keep_order_and_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let z = dir.path().join("z.txt");
        let a = dir.path().join("a.log");
        fs::write(&z, LOG).unwrap();
        fs::write(&a, LOG).unwrap();

        let outcome = collect(&[&z, &a], &aggregator(Metrics::default()));
        assert!(outcome.is_complete());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            outcome.report,
            vec![
                ReportEntry {
                    file: "z.txt".to_string(),
                    ..Default::default()
                },
                ReportEntry {
                    file: "a.log".to_string(),
                    ..Default::default()
                },
            ]
        );
    }

    #[test]
    fn test_file_without_data_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.log");
        fs::write(&path, "header\nnot a log line\n").unwrap();
        let outcome = collect(&[&path], &aggregator(Metrics::all()));
        assert!(outcome.is_complete());
        assert_eq!(
            outcome.report,
            vec![ReportEntry {
                file: "garbage.log".to_string(),
                total_bytes_exchanged: Some(0),
                ..Default::default()
            }]
        );
    }
}
