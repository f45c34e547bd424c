// Battery: POWER_SUPPLY_* key=value lines from the power supply uevent file

use super::Metric;

/// Last seen uevent values. Keys missing from a read keep their previous value.
#[derive(Debug, Default, Clone)]
pub struct BatteryMetric {
    pub charge_now: u64,
    pub current_now: u64,
    pub charge_full: u64,
    pub status: String,
}

impl BatteryMetric {
    /// Applies every complete (newline terminated) `KEY=VALUE` line.
    pub fn update(&mut self, raw: &str) {
        let lines = raw
            .split_inclusive('\n')
            .filter_map(|line| line.strip_suffix('\n'));
        for line in lines {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "POWER_SUPPLY_CHARGE_NOW" => self.charge_now = parse_u64(value),
                "POWER_SUPPLY_CURRENT_NOW" => self.current_now = parse_u64(value),
                "POWER_SUPPLY_CHARGE_FULL" => self.charge_full = parse_u64(value),
                "POWER_SUPPLY_STATUS" => self.status = value.to_string(),
                _ => {}
            }
        }
    }

    pub fn percent(&self) -> u64 {
        (self.charge_now * 100)
            .checked_div(self.charge_full)
            .unwrap_or(0)
    }

    /// Seconds until empty, or until full while charging. `None` without a current reading.
    pub fn remaining_secs(&self) -> Option<u64> {
        if self.current_now == 0 {
            return None;
        }
        let remaining = if self.status == "Charging" {
            self.charge_full.saturating_sub(self.charge_now)
        } else {
            self.charge_now
        };
        Some(remaining * 3600 / self.current_now)
    }

    pub fn format(&self) -> String {
        match self.remaining_secs() {
            None => format!("Battery: {}% ??:??:?? {}", self.percent(), self.status),
            Some(secs) => format!(
                "Battery: {}% {}:{:02}:{:02} {}",
                self.percent(),
                secs / 3600,
                secs % 3600 / 60,
                secs % 60,
                self.status
            ),
        }
    }
}

impl Metric for BatteryMetric {
    const NAME: &'static str = "battery";

    fn sample(&mut self, raw: &str) -> String {
        self.update(raw);
        self.format()
    }
}

fn parse_u64(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}
