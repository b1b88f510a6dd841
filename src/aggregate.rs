use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use crate::{
    error::{FileAccessError, LineError, MetricError},
    parser::{space::SpaceDelimitedParser, LineParser},
};

/// Which statistics the caller asked for. Anything not requested is never computed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub most_frequent_ip: bool,
    pub least_frequent_ip: bool,
    pub events_per_second: bool,
    pub total_bytes: bool,
}

impl Metrics {
    pub fn all() -> Self {
        Self {
            most_frequent_ip: true,
            least_frequent_ip: true,
            events_per_second: true,
            total_bytes: true,
        }
    }

    pub fn tracks_ips(&self) -> bool {
        self.most_frequent_ip || self.least_frequent_ip
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Leading lines dropped without being looked at. Access logs here carry a one-line banner.
    pub skip_header_lines: usize,
    pub min_fields: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            skip_header_lines: 1,
            min_fields: crate::parser::MIN_FIELDS,
        }
    }
}

/// Per-line failure counters, for diagnostics only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SkipCounts {
    pub malformed: u64,
    pub encoding: u64,
    pub bytes: u64,
    pub timestamp: u64,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FileStats {
    pub path: PathBuf,
    pub ip_counts: HashMap<String, u64>,
    pub total_bytes: u64,
    /// First and last parsed timestamp
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// Lines that parsed, header lines excluded
    pub line_count: u64,
    pub skipped: SkipCounts,
}

impl FileStats {
    /// Base name used in the report. Falls back to the full path for things like `..`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or(self.path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn events_per_second(&self) -> Result<f64, MetricError> {
        let (start, end) = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(MetricError::NoTimestamps),
        };
        if start > end {
            return Err(MetricError::TimeOrder { start, end });
        }
        if start == end {
            return Err(MetricError::DivisionByZero(start));
        }
        Ok(self.line_count as f64 / (end - start))
    }

    /// IP with the highest count, ties going to the smallest address string.
    pub fn most_frequent_ip(&self) -> Option<&str> {
        self.ip_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(ip, _)| ip.as_str())
    }

    /// IP with the lowest count, ties going to the smallest address string.
    pub fn least_frequent_ip(&self) -> Option<&str> {
        self.ip_counts
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(ip, _)| ip.as_str())
    }
}

pub struct FileAggregator {
    metrics: Metrics,
    config: AggregatorConfig,
    parser: Box<dyn LineParser>,
}

impl FileAggregator {
    pub fn new(metrics: Metrics, config: AggregatorConfig) -> Self {
        let parser = Box::new(SpaceDelimitedParser::with_min_fields(config.min_fields));
        Self {
            metrics,
            config,
            parser,
        }
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    /// Open `path` and scan it. The handle is dropped before returning on every path.
    pub fn process_file(&self, path: &Path) -> Result<FileStats, FileAccessError> {
        let file = File::open(path).map_err(|source| FileAccessError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.process_reader(path, BufReader::new(file))
    }

    /// Scan an already opened log. `path` only names the source in stats and log messages.
    pub fn process_reader<R: Read>(
        &self,
        path: &Path,
        reader: BufReader<R>,
    ) -> Result<FileStats, FileAccessError> {
        let mut stats = FileStats {
            path: path.to_path_buf(),
            ..Default::default()
        };
        let track_ips = self.metrics.tracks_ips();

        for (idx, raw) in reader.split(b'\n').enumerate() {
            let lineno = idx + 1;
            let raw = raw.map_err(|source| FileAccessError::Read {
                path: path.to_path_buf(),
                line: lineno,
                source,
            })?;
            if idx < self.config.skip_header_lines {
                continue;
            }

            let line = match self.parser.parse_bytes(&raw) {
                Ok(line) => line,
                Err(e) => {
                    match e {
                        LineError::MalformedLine { .. } => stats.skipped.malformed += 1,
                        LineError::Encoding(_) => stats.skipped.encoding += 1,
                    }
                    tracing::error!(
                        "Line {} of {} skipped: {}",
                        lineno,
                        path.display(),
                        e
                    );
                    continue;
                }
            };
            stats.line_count += 1;

            if self.metrics.events_per_second {
                match line.timestamp() {
                    Ok(ts) => {
                        stats.start_time.get_or_insert(ts);
                        stats.end_time = Some(ts);
                    }
                    Err(e) => {
                        stats.skipped.timestamp += 1;
                        tracing::error!("{} in line {} of {}", e, lineno, path.display());
                    }
                }
            }
            if track_ips {
                *stats
                    .ip_counts
                    .entry(line.client_ip().to_string())
                    .or_default() += 1;
            }
            if self.metrics.total_bytes {
                match line.bytes_exchanged() {
                    Ok(bytes) => stats.total_bytes = stats.total_bytes.saturating_add(bytes),
                    Err(e) => {
                        stats.skipped.bytes += 1;
                        tracing::error!(
                            "{} in line {} of {}, skipping",
                            e,
                            lineno,
                            path.display()
                        );
                    }
                }
            }
        }

        if let (Some(start), Some(end)) = (stats.start_time, stats.end_time) {
            if start > end {
                tracing::error!(
                    "End time {} is before start time {}, {} looks corrupted",
                    end,
                    start,
                    path.display()
                );
            }
        }

        tracing::info!(
            "Processed {}: {} lines, {} exchanged",
            path.display(),
            stats.line_count,
            humansize::format_size(stats.total_bytes, humansize::BINARY)
        );
        tracing::debug!("Skipped in {}: {:?}", path.display(), stats.skipped);

        Ok(stats)
    }
}
