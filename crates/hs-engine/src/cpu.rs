#![forbid(unsafe_code)]
use hs_core::{EventId, HsError, HsResult, Severity, UTIL_HISTORY_LEN, UTIL_MAX, UTIL_UNAVAILABLE};
use hs_hal::{EventSink, UtilizationSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtilizationConfig {
    /// Processing cycles per utilization interval.
    pub cycles_per_interval: u32,
    /// Samples in the rolling average (K <= N).
    pub average_window: usize,
    /// Utilization at or above this counts toward hogging.
    pub hogging_threshold: u32,
    /// Consecutive intervals at/above threshold that constitute hogging.
    pub max_hogging_intervals: u32,
}

impl Default for UtilizationConfig {
    fn default() -> Self {
        Self {
            cycles_per_interval: 1,
            average_window: 4,
            hogging_threshold: 9_900,
            max_hogging_intervals: 5,
        }
    }
}

impl UtilizationConfig {
    pub fn validate(&self) -> HsResult<()> {
        if self.cycles_per_interval == 0
            || self.average_window == 0
            || self.average_window > UTIL_HISTORY_LEN
        {
            return Err(HsError::InvalidState);
        }
        Ok(())
    }
}

/// Rolling CPU utilization history with hogging detection.
#[derive(Debug, Clone)]
pub struct UtilizationTracker {
    config: UtilizationConfig,
    hogging_enabled: bool,
    samples: [u32; UTIL_HISTORY_LEN],
    write_index: usize,
    hogging_streak: u32,
    average: u32,
    peak: u32,
    cycle: u32,
}

impl UtilizationTracker {
    pub fn new(config: UtilizationConfig, hogging_enabled: bool) -> Self {
        Self {
            config,
            hogging_enabled,
            samples: [0; UTIL_HISTORY_LEN],
            write_index: 0,
            hogging_streak: 0,
            average: 0,
            peak: 0,
            cycle: 0,
        }
    }

    pub fn hogging_enabled(&self) -> bool {
        self.hogging_enabled
    }

    pub fn set_hogging_enabled(&mut self, enabled: bool) {
        self.hogging_enabled = enabled;
    }

    pub fn average(&self) -> u32 {
        self.average
    }

    pub fn peak(&self) -> u32 {
        self.peak
    }

    pub fn hogging_streak(&self) -> u32 {
        self.hogging_streak
    }

    pub fn samples(&self) -> &[u32; UTIL_HISTORY_LEN] {
        &self.samples
    }

    /// Called every processing cycle; samples once per interval.
    pub fn on_cycle(&mut self, source: &mut dyn UtilizationSource, sink: &mut dyn EventSink) {
        self.cycle += 1;
        if self.cycle >= self.config.cycles_per_interval {
            self.cycle = 0;
            self.monitor_utilization(source, sink);
        }
    }

    pub fn monitor_utilization(&mut self, source: &mut dyn UtilizationSource, sink: &mut dyn EventSink) {
        let index = self.write_index;
        self.write_index = (index + 1) % UTIL_HISTORY_LEN;

        // History is left alone when the board has nothing for us.
        let sample = match source.sample() {
            Some(raw) => raw.min(UTIL_MAX),
            None => {
                self.average = UTIL_UNAVAILABLE;
                self.peak = UTIL_UNAVAILABLE;
                return;
            }
        };

        if sample >= self.config.hogging_threshold && self.hogging_enabled {
            self.hogging_streak = self.hogging_streak.saturating_add(1);
            if self.hogging_streak == self.config.max_hogging_intervals {
                sink.notify(
                    Severity::Error,
                    EventId::CpuHogging,
                    format_args!(
                        "CPU Hogging Detected: {} intervals at or above {}",
                        self.hogging_streak, self.config.hogging_threshold
                    ),
                );
            }
        } else {
            self.hogging_streak = 0;
        }

        self.samples[index] = sample;
        self.peak = self.samples.iter().copied().max().unwrap_or(0);

        let window = self.config.average_window.clamp(1, UTIL_HISTORY_LEN);
        let sum: u32 = (0..window)
            .map(|back| self.samples[(index + UTIL_HISTORY_LEN - back) % UTIL_HISTORY_LEN])
            .sum();
        self.average = sum / window as u32;
    }
}
