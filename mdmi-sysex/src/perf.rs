//! Ping latency sampling

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SessionError;
use crate::session::{Outcome, Session};
use crate::transport::Transport;

/// When a performance run stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfLimit {
    /// Stop starting new pings once this much time has passed
    Duration(Duration),
    /// Send exactly this many pings
    Count(usize),
}

/// Settings for [`run_perf_test`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfConfig {
    pub limit: PerfLimit,
    /// Pause after each ping
    pub interval: Duration,
    /// Wait for each pong
    pub timeout: Duration,
    /// Minimum time between progress callbacks
    pub progress_interval: Duration,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            limit: PerfLimit::Duration(Duration::from_secs(10)),
            interval: Duration::from_millis(50),
            timeout: Duration::from_secs(2),
            progress_interval: Duration::from_millis(500),
        }
    }
}

/// Summary statistics over latency samples, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, `None` for a single sample
    pub std_dev: Option<f64>,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyStats {
    /// `None` when there are no samples
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std_dev = (count > 1).then(|| {
            let variance =
                sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        });

        Some(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median: percentile(&sorted, 50.0),
            std_dev,
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        })
    }
}

/// Linearly interpolated percentile of sorted, non-empty data
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// Snapshot passed to the progress callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfProgress {
    pub elapsed: Duration,
    pub successful: usize,
    pub failed: usize,
    pub stats: Option<LatencyStats>,
}

/// Result of a performance run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerfReport {
    /// Latency of each answered ping, in milliseconds, in send order
    pub latencies_ms: Vec<f64>,
    /// Pings that timed out or got a reply other than pong
    pub failed: usize,
    pub elapsed: Duration,
}

impl PerfReport {
    pub fn successful(&self) -> usize {
        self.latencies_ms.len()
    }

    pub fn sent(&self) -> usize {
        self.successful() + self.failed
    }

    /// Percentage of answered pings, `None` if nothing was sent
    pub fn success_rate(&self) -> Option<f64> {
        let sent = self.sent();
        (sent > 0).then(|| self.successful() as f64 / sent as f64 * 100.0)
    }

    pub fn stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_samples(&self.latencies_ms)
    }
}

/// Ping the device repeatedly and collect round-trip latencies
///
/// Timeouts and unexpected replies count as failed pings; only transport
/// errors abort the run.
pub fn run_perf_test<T: Transport>(
    session: &mut Session<T>,
    config: &PerfConfig,
    mut on_progress: impl FnMut(&PerfProgress),
) -> Result<PerfReport, SessionError> {
    let start = Instant::now();
    let mut report = PerfReport::default();
    let mut last_progress: Option<Instant> = None;

    loop {
        let done = match config.limit {
            PerfLimit::Duration(limit) => start.elapsed() >= limit,
            PerfLimit::Count(count) => report.sent() >= count,
        };
        if done {
            break;
        }

        match session.ping(config.timeout)? {
            Outcome::Matched { elapsed, .. } => {
                report.latencies_ms.push(elapsed.as_secs_f64() * 1000.0);
            }
            Outcome::TimedOut { .. } | Outcome::Malformed { .. } => report.failed += 1,
        }

        if last_progress.is_none_or(|at| at.elapsed() >= config.progress_interval) {
            on_progress(&PerfProgress {
                elapsed: start.elapsed(),
                successful: report.successful(),
                failed: report.failed,
                stats: report.stats(),
            });
            last_progress = Some(Instant::now());
        }

        std::thread::sleep(config.interval);
    }

    report.elapsed = start.elapsed();
    debug!(
        sent = report.sent(),
        failed = report.failed,
        elapsed = ?report.elapsed,
        "Performance run finished"
    );
    Ok(report)
}
