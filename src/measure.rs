//! Child-process resource sampling (Linux). Observations land in the same
//! `Aggregator` contract the log pipeline uses; only the producer differs.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use procfs::process::Process;
use tracing::{debug, warn};

use crate::aggregate::{Aggregator, EmptyAggregate, Summary};
use crate::error::Error;

/// Resource usage of one complete child run. Integer units throughout
/// (milliseconds, kibibytes) so the values fit the aggregation contract
/// unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunMeasurement {
    pub clock_ms: i64,
    pub user_ms: i64,
    pub system_ms: i64,
    pub rss_max_kib: i64,
}

pub const METRICS: [&str; 4] = ["clock", "user", "system", "rss_max"];

impl RunMeasurement {
    fn metric(&self, name: &str) -> i64 {
        match name {
            "clock" => self.clock_ms,
            "user" => self.user_ms,
            "system" => self.system_ms,
            "rss_max" => self.rss_max_kib,
            other => unreachable!("unknown run metric {other}"),
        }
    }
}

/// Spawn the command `runs` times, sampling `/proc/<pid>` every `interval`
/// while it lives. CPU times are the last observed sample; peak RSS is the
/// running maximum of VmHWM.
pub fn measure(
    program: &str,
    args: &[String],
    runs: u32,
    interval: Duration,
) -> Result<Vec<RunMeasurement>, Error> {
    let mut measurements = Vec::with_capacity(runs as usize);
    for run in 1..=runs {
        debug!(run, program, "starting run");
        measurements.push(measure_once(program, args, interval)?);
    }
    Ok(measurements)
}

fn measure_once(
    program: &str,
    args: &[String],
    interval: Duration,
) -> Result<RunMeasurement, Error> {
    let started = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let pid = child.id() as i32;
    let ticks_per_second = procfs::ticks_per_second();

    let mut measurement = RunMeasurement::default();
    loop {
        if child.try_wait()?.is_some() {
            break;
        }
        // The proc entry can vanish between try_wait and the read, or be
        // unreadable; skip the sample and keep waiting.
        match Process::new(pid) {
            Ok(process) => {
                if let Ok(stat) = process.stat() {
                    measurement.user_ms = ticks_to_ms(stat.utime, ticks_per_second);
                    measurement.system_ms = ticks_to_ms(stat.stime, ticks_per_second);
                }
                if let Ok(status) = process.status() {
                    if let Some(hwm_kib) = status.vmhwm {
                        measurement.rss_max_kib = measurement.rss_max_kib.max(hwm_kib as i64);
                    }
                }
            }
            Err(error) => warn!(pid, %error, "sample skipped"),
        }
        std::thread::sleep(interval);
    }
    measurement.clock_ms = started.elapsed().as_millis() as i64;
    Ok(measurement)
}

fn ticks_to_ms(ticks: u64, ticks_per_second: u64) -> i64 {
    (ticks.saturating_mul(1000) / ticks_per_second.max(1)) as i64
}

/// Fold every run into one distribution-mode aggregator per metric, in the
/// order of `METRICS`.
pub fn summarize_runs(
    measurements: &[RunMeasurement],
) -> Result<Vec<(&'static str, Summary)>, EmptyAggregate> {
    METRICS
        .iter()
        .map(| &name | {
            let mut aggregator = Aggregator::with_distribution();
            for measurement in measurements {
                aggregator.observe(measurement.metric(name));
            }
            Ok((name, aggregator.summarize()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_every_run_of_a_short_command() {
        let measurements = measure("true", &[], 2, Duration::from_millis(5)).unwrap();
        assert_eq!(measurements.len(), 2);
        assert!(measurements.iter().all(| m | m.clock_ms >= 0));
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(measure("/nonexistent/program", &[], 1, Duration::from_millis(5)).is_err());
    }

    #[test]
    fn summarize_covers_all_four_metrics() {
        let runs = [
            RunMeasurement { clock_ms: 100, user_ms: 60, system_ms: 10, rss_max_kib: 2048 },
            RunMeasurement { clock_ms: 200, user_ms: 80, system_ms: 30, rss_max_kib: 4096 },
        ];
        let summaries = summarize_runs(&runs).unwrap();
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries[0].0, "clock");
        assert_eq!(summaries[0].1.mean, 150.0);
        let rss = summaries[3].1.distribution.unwrap();
        assert_eq!(rss.min, 2048.0);
        assert_eq!(rss.max, 4096.0);
    }

    #[test]
    fn summarize_of_no_runs_is_empty_aggregate() {
        assert_eq!(summarize_runs(&[]), Err(EmptyAggregate));
    }

    #[test]
    fn ticks_convert_to_milliseconds() {
        assert_eq!(ticks_to_ms(100, 100), 1000);
        assert_eq!(ticks_to_ms(50, 100), 500);
        assert_eq!(ticks_to_ms(0, 100), 0);
    }
}
