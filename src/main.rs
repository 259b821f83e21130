use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use logstat::parse::{PatternParser, SplitParser};
use logstat::pipeline::{self, RunReport};
use logstat::{generate, table, DEFAULT_METRIC};

#[derive(Parser, Debug)]
#[command(name = "logstat", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra logging (chunking decisions, per-run sampling)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a log file and aggregate one metric
    Parse {
        /// Plain or .gz log file
        file: PathBuf,

        /// Metric name to extract
        #[arg(short, long, default_value = DEFAULT_METRIC)]
        metric: String,

        /// Parsing strategy
        #[arg(long, value_enum, default_value_t = ParserKind::Split)]
        parser: ParserKind,

        /// Report min/quartiles/max, not just the mean
        #[arg(short, long)]
        distribution: bool,

        /// Chunked scan across workers (plain files only)
        #[arg(short, long)]
        parallel: bool,

        /// Chunk count for --parallel (default: available cores)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Write a log file in the three-field format
    Generate {
        /// Output path; gzipped when it ends in .gz
        file: PathBuf,

        #[arg(short, long, default_value_t = 5_000_000)]
        lines: u64,

        #[arg(short, long, default_value = DEFAULT_METRIC)]
        metric: String,
    },
    /// Run a command repeatedly and summarize its resource usage (Linux)
    Measure {
        #[arg(short, long, default_value_t = 5)]
        runs: u32,

        /// Sampling interval in milliseconds
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,

        /// Command and arguments to measure
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ParserKind {
    Split,
    Pattern,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Parse { file, metric, parser, distribution, parallel, threads } => {
            let report = scan(&file, &metric, parser, distribution, parallel, threads)?;
            info!(
                lines_read = report.lines_read,
                matched = report.matched,
                filtered = report.filtered,
                malformed = report.malformed,
                invalid_value = report.invalid_value,
                "scan complete"
            );
            let summary = report.aggregator.summarize()?;
            match summary.distribution {
                Some(_) => print!("{}", table::distribution_table(&[(metric.as_str(), summary)])),
                None => println!("avg: {}", summary.mean),
            }
        }
        Commands::Generate { file, lines, metric } => {
            generate::generate(&file, lines, &metric)?;
            info!(lines, metric = %metric, file = %file.display(), "log file written");
        }
        Commands::Measure { runs, interval_ms, command } => {
            run_measure(runs, interval_ms, &command)?;
        }
    }
    Ok(())
}

fn scan(
    file: &std::path::Path,
    metric: &str,
    parser: ParserKind,
    distribution: bool,
    parallel: bool,
    threads: Option<usize>,
) -> Result<RunReport> {
    let target = metric.as_bytes();
    let report = match (parser, parallel) {
        (ParserKind::Split, false) => pipeline::run(file, SplitParser, target, distribution)?,
        (ParserKind::Pattern, false) => {
            pipeline::run(file, PatternParser::new(), target, distribution)?
        }
        (ParserKind::Split, true) => {
            pipeline::run_parallel(file, &SplitParser, target, distribution, threads)?
        }
        (ParserKind::Pattern, true) => {
            pipeline::run_parallel(file, &PatternParser::new(), target, distribution, threads)?
        }
    };
    Ok(report)
}

#[cfg(target_os = "linux")]
fn run_measure(runs: u32, interval_ms: u64, command: &[String]) -> Result<()> {
    use std::time::Duration;

    use logstat::measure;

    let (program, args) = command.split_first().expect("clap enforces a command");
    let measurements =
        measure::measure(program, args, runs, Duration::from_millis(interval_ms))?;
    let summaries = measure::summarize_runs(&measurements)?;
    println!("Summary of {} runs", measurements.len());
    print!("{}", table::distribution_table(&summaries));
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run_measure(_runs: u32, _interval_ms: u64, _command: &[String]) -> Result<()> {
    anyhow::bail!("measure relies on procfs and is only supported on Linux")
}
