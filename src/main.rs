use clap::{ArgAction, Parser};
use logtally::{
    collect::{collect, EXIT_FATAL},
    parser::MIN_FIELDS,
    write_report, AggregatorConfig, FileAggregator, Metrics,
};
use shadow_rs::shadow;
use std::{path::PathBuf, process::ExitCode};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

shadow!(build);

#[derive(Parser, Debug)]
#[command(about = "Log Processor", version = build::PKG_VERSION, long_version = build::CLAP_LONG_VERSION)]
struct Cli {
    /// Log files, or directories whose `*.log` files are read
    #[clap(required = true)]
    filenames: Vec<PathBuf>,

    /// Computes most frequent IP
    #[clap(short = 'm', long = "most_frequent_ip")]
    most_frequent_ip: bool,

    /// Computes least frequent IP
    #[clap(short = 'l', long = "least_frequent_ip")]
    least_frequent_ip: bool,

    /// Computes events per second
    #[clap(short = 'e', long = "events_per_second")]
    events_per_second: bool,

    /// Computes total bytes exchanged
    #[clap(short = 't', long = "total_bytes_exchanged")]
    total_bytes_exchanged: bool,

    /// Report destination (stdout if omitted)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Lines at the top of each file that are not data
    #[clap(long, default_value_t = 1)]
    skip_header_lines: usize,

    /// Lines with fewer whitespace-separated fields are skipped
    #[clap(long, default_value_t = MIN_FIELDS)]
    min_fields: usize,

    /// -v for info, -vv for debug
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Same as -vv
    #[clap(long)]
    very_verbose: bool,
}

impl Cli {
    fn metrics(&self) -> Metrics {
        Metrics {
            most_frequent_ip: self.most_frequent_ip,
            least_frequent_ip: self.least_frequent_ip,
            events_per_second: self.events_per_second,
            total_bytes: self.total_bytes_exchanged,
        }
    }

    fn level(&self) -> LevelFilter {
        match (self.verbose, self.very_verbose) {
            (_, true) => LevelFilter::DEBUG,
            (0, _) => LevelFilter::WARN,
            (1, _) => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }

    fn config(&self) -> AggregatorConfig {
        AggregatorConfig {
            skip_header_lines: self.skip_header_lines,
            min_fields: self.min_fields,
        }
    }
}

fn setup_logging(level: LevelFilter) -> anyhow::Result<()> {
    let enable_color = std::env::var("NO_COLOR").is_err();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_ansi(enable_color)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install logger failed: {}", e))
}

fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(e) = setup_logging(args.level()) {
        eprintln!("{:#}", e);
        return ExitCode::from(EXIT_FATAL);
    }
    tracing::debug!("{:?}", args);
    tracing::debug!("Starting log processing");

    let aggregator = FileAggregator::new(args.metrics(), args.config());
    let outcome = collect(args.filenames.as_slice(), &aggregator);

    if let Err(e) = write_report(&outcome.report, args.output.as_deref()) {
        tracing::error!("{:#}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    if !outcome.is_complete() {
        tracing::warn!(
            "{} of {} inputs could not be processed: {:?}",
            outcome.failures.len(),
            outcome.failures.len() + outcome.report.len(),
            outcome
                .failures
                .iter()
                .map(|f| f.path.display().to_string())
                .collect::<Vec<_>>()
        );
    } else {
        tracing::info!("Ended log processing, {} files reported", outcome.report.len());
    }
    ExitCode::from(outcome.exit_code())
}
