//! Perf-test command - repeated pings with latency statistics

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use mdmi_sysex::{PerfConfig, PerfLimit, PerfProgress, PerfReport, run_perf_test};

use super::Context;
use crate::config;

/// Run length when neither `--duration` nor `--count` is given
const DEFAULT_DURATION: Duration = Duration::from_secs(10);

/// Arguments for the perf-test command
#[derive(Args)]
pub struct PerfArgs {
    /// Test duration in seconds (default: 10)
    #[arg(long, conflicts_with = "count")]
    pub duration: Option<f64>,

    /// Number of pings to send instead of a duration
    #[arg(long)]
    pub count: Option<usize>,

    /// Seconds between pings
    #[arg(long)]
    pub interval: Option<f64>,

    /// Seconds to wait for each pong
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Write every latency sample to a CSV file (default: perf_YYYYMMDD_HHMMSS.csv)
    #[arg(long, value_name = "FILE")]
    pub csv: Option<Option<PathBuf>>,
}

impl PerfArgs {
    fn perf_config(&self, context: &Context) -> Result<PerfConfig> {
        let limit = match (self.count, self.duration) {
            (Some(count), _) => PerfLimit::Count(count),
            (None, Some(secs)) => PerfLimit::Duration(config::secs(secs)?),
            (None, None) => PerfLimit::Duration(DEFAULT_DURATION),
        };
        let perf = &context.config.perf;
        Ok(PerfConfig {
            limit,
            interval: config::secs(self.interval.unwrap_or(perf.interval_secs))?,
            timeout: config::secs(self.timeout.unwrap_or(perf.timeout_secs))?,
            ..PerfConfig::default()
        })
    }
}

/// Execute the perf-test command
pub fn execute(args: PerfArgs, context: &Context) -> Result<()> {
    let perf_config = args.perf_config(context)?;
    let mut session = context.open()?;

    let transport = session.transport();
    println!("Starting performance test on {}...", transport.port_name());
    if let Some(input) = transport.input_port_name()
        && input != transport.port_name()
    {
        println!("Listening for responses on {input}...");
    }
    match perf_config.limit {
        PerfLimit::Duration(limit) => println!("Test duration: {} seconds", limit.as_secs_f64()),
        PerfLimit::Count(count) => println!("Ping count: {count}"),
    }
    println!("Ping interval: {} seconds", perf_config.interval.as_secs_f64());
    println!("Individual timeout: {} seconds", perf_config.timeout.as_secs_f64());
    println!();

    let result = run_perf_test(&mut session, &perf_config, print_progress);
    // Finish the progress line
    println!();
    session.close()?;
    let report = result?;

    print!("{}", format_report(&report));

    if let Some(csv) = &args.csv {
        let path = csv.clone().unwrap_or_else(default_csv_filename);
        write_csv(&report, &path)?;
        println!("\nLatencies saved to: {}", path.display());
    }
    Ok(())
}

fn print_progress(progress: &PerfProgress) {
    let (min, max, mean, median) = progress
        .stats
        .map(|s| (s.min, s.max, s.mean, s.median))
        .unwrap_or_default();
    print!(
        "\r\x1b[KElapsed: {:.1}s | Pings: {} | Failed: {} | Min: {min:.1}ms | Max: {max:.1}ms | Avg: {mean:.1}ms | Median: {median:.1}ms",
        progress.elapsed.as_secs_f64(),
        progress.successful,
        progress.failed,
    );
    let _ = std::io::stdout().flush();
}

/// Final summary shown after the run
pub(crate) fn format_report(report: &PerfReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nPerformance Test Complete");
    let _ = writeln!(out, "Total duration: {:.1} seconds", report.elapsed.as_secs_f64());
    let _ = writeln!(out, "Total pings sent: {}", report.sent());
    let _ = writeln!(out, "Successful pings: {}", report.successful());
    let _ = writeln!(out, "Failed pings: {}", report.failed);

    let (Some(rate), Some(stats)) = (report.success_rate(), report.stats()) else {
        let _ = writeln!(out, "No successful pings recorded");
        return out;
    };
    let _ = writeln!(out, "Success rate: {rate:.1}%");
    let _ = writeln!(out, "\nLatency Statistics:");
    let _ = writeln!(out, "  Minimum:  {:.2} ms", stats.min);
    let _ = writeln!(out, "  Maximum:  {:.2} ms", stats.max);
    let _ = writeln!(out, "  Average:  {:.2} ms", stats.mean);
    let _ = writeln!(out, "  Median:   {:.2} ms", stats.median);
    if let Some(std_dev) = stats.std_dev {
        let _ = writeln!(out, "  Std Dev:  {std_dev:.2} ms");
        let _ = writeln!(out, "  95th %ile: {:.2} ms", stats.p95);
        let _ = writeln!(out, "  99th %ile: {:.2} ms", stats.p99);
    }
    out
}

fn default_csv_filename() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("perf_{timestamp}.csv"))
}

pub(crate) fn write_csv(report: &PerfReport, path: &Path) -> Result<()> {
    let mut content = String::from("ping,latency_ms\n");
    for (index, latency) in report.latencies_ms.iter().enumerate() {
        let _ = writeln!(content, "{},{latency:.3}", index + 1);
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
