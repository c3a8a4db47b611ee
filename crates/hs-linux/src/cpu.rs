use std::path::PathBuf;

use hs_core::UTIL_MAX;
use hs_hal::UtilizationSource;
use log::debug;

/// Aggregate jiffies from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    pub fn parse(stat: &str) -> Option<Self> {
        let line = stat.lines().find(|l| l.starts_with("cpu "))?;
        let fields: Vec<u64> = line
            .split_whitespace()
            .skip(1)
            .map(|f| f.parse().ok())
            .collect::<Option<_>>()?;
        if fields.len() < 4 {
            return None;
        }
        // idle + iowait
        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        // guest time is already folded into user/nice
        let total: u64 = fields.iter().take(8).sum();
        Some(Self { busy: total.saturating_sub(idle), total })
    }

    /// Utilization between two readings, scaled to `0..=UTIL_MAX`.
    pub fn utilization_since(&self, earlier: &CpuTimes) -> Option<u32> {
        let total = self.total.checked_sub(earlier.total)?;
        let busy = self.busy.checked_sub(earlier.busy)?;
        if total == 0 {
            return None;
        }
        Some(((busy * u64::from(UTIL_MAX)) / total).min(u64::from(UTIL_MAX)) as u32)
    }
}

/// Samples whole-machine utilization from `/proc/stat` deltas.
pub struct ProcStatSampler {
    path: PathBuf,
    last: Option<CpuTimes>,
}

impl ProcStatSampler {
    pub fn new() -> Self {
        Self::with_path("/proc/stat")
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), last: None }
    }
}

impl Default for ProcStatSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl UtilizationSource for ProcStatSampler {
    fn sample(&mut self) -> Option<u32> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!("{} unreadable: {}", self.path.display(), e);
                return None;
            }
        };
        let now = CpuTimes::parse(&text)?;
        // The first reading only establishes the baseline.
        let earlier = self.last.replace(now)?;
        now.utilization_since(&earlier)
    }
}
