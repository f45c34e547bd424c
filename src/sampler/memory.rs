// Memory: MemTotal and MemFree from /proc/meminfo

use super::Metric;

/// Token positions in the whitespace-split file ("MemTotal: N kB MemFree: N kB ...").
const TOTAL_FIELD: usize = 1;
const FREE_FIELD: usize = 4;

#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryMetric;

impl MemoryMetric {
    pub fn percent_used(total: u64, free: u64) -> u64 {
        (total.saturating_sub(free) * 100)
            .checked_div(total)
            .unwrap_or(0)
    }
}

impl Metric for MemoryMetric {
    const NAME: &'static str = "memory";

    fn sample(&mut self, raw: &str) -> String {
        let fields: Vec<&str> = raw.split_whitespace().collect();
        let field = |i: usize| {
            fields
                .get(i)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        };
        format!(
            "Memory: {}%",
            Self::percent_used(field(TOTAL_FIELD), field(FREE_FIELD))
        )
    }
}
