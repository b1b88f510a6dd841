use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::aggregate::{FileStats, Metrics};

/// One object of the output array. Unrequested or uncomputable metrics serialize as `null`.
#[derive(Debug, Serialize, Default, Clone, PartialEq)]
pub struct ReportEntry {
    #[serde(rename = "File")]
    pub file: String,
    #[serde(rename = "MostFrequentIP")]
    pub most_frequent_ip: Option<String>,
    #[serde(rename = "LeastFrequentIP")]
    pub least_frequent_ip: Option<String>,
    #[serde(rename = "EventsPerSecond")]
    pub events_per_second: Option<f64>,
    #[serde(rename = "TotalAmountsBytesExchanged")]
    pub total_bytes_exchanged: Option<u64>,
}

pub type Report = Vec<ReportEntry>;

impl ReportEntry {
    pub fn from_stats(stats: &FileStats, metrics: Metrics) -> Self {
        let file = stats.file_name();
        if metrics.tracks_ips() && stats.ip_counts.is_empty() {
            tracing::warn!("No client IPs recorded for {}", stats.path.display());
        }
        let events_per_second = if metrics.events_per_second {
            match stats.events_per_second() {
                Ok(eps) => Some(eps),
                Err(e) => {
                    tracing::error!("Events per second unavailable for {}: {}", file, e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            most_frequent_ip: metrics
                .most_frequent_ip
                .then(|| stats.most_frequent_ip().map(str::to_owned))
                .flatten(),
            least_frequent_ip: metrics
                .least_frequent_ip
                .then(|| stats.least_frequent_ip().map(str::to_owned))
                .flatten(),
            events_per_second,
            total_bytes_exchanged: metrics.total_bytes.then_some(stats.total_bytes),
            file,
        }
    }
}

/// Serialize `report` as a JSON array. With no `output`, it goes to stdout.
///
/// A file destination is written to a fresh temp file in the same directory and then
/// persisted over `output`, so an interrupted run never leaves half a report behind.
pub fn write_report(report: &[ReportEntry], output: Option<&Path>) -> Result<()> {
    let data = serde_json::to_string(report).context("serialize report failed")?;
    let Some(output) = output else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", data).context("write report to stdout failed")?;
        return Ok(());
    };

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {} failed", dir.display()))?;
    tmp.write_all(data.as_bytes())
        .with_context(|| format!("write {} failed", tmp.path().display()))?;
    // dropping the temp file on error removes it
    tmp.persist(output)
        .with_context(|| format!("move report to {} failed", output.display()))?;
    tracing::info!(
        "Report with {} entries written to {}",
        report.len(),
        output.display()
    );
    Ok(())
}
