// CPU: user/nice/system/idle jiffies from the first line of /proc/stat

use super::Metric;

/// Aggregate jiffy counters (tokens 1..=4 of the file).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuCounters {
    /// Reads the counters; a missing or non-numeric token reads as zero.
    pub fn parse(raw: &str) -> Self {
        let mut fields = raw
            .split_whitespace()
            .skip(1)
            .map(|field| field.parse::<u64>().unwrap_or(0));
        let mut next = || fields.next().unwrap_or(0);
        Self {
            user: next(),
            nice: next(),
            system: next(),
            idle: next(),
        }
    }
}

/// Reports raw jiffy deltas between consecutive ticks. The first tick is measured
/// against all-zero counters.
#[derive(Debug, Default, Clone)]
pub struct CpuMetric {
    pub previous: CpuCounters,
}

impl CpuMetric {
    pub fn format(previous: &CpuCounters, current: &CpuCounters) -> String {
        let delta = |now: u64, before: u64| now as i64 - before as i64;
        format!(
            "CPU: {}% user {}% system {}% idel",
            delta(current.user, previous.user) + delta(current.nice, previous.nice),
            delta(current.system, previous.system),
            delta(current.idle, previous.idle)
        )
    }
}

impl Metric for CpuMetric {
    const NAME: &'static str = "cpu";

    fn sample(&mut self, raw: &str) -> String {
        let current = CpuCounters::parse(raw);
        let text = Self::format(&self.previous, &current);
        self.previous = current;
        text
    }
}
