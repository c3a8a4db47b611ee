#![forbid(unsafe_code)]
use hs_core::{EventId, ResetCounters, Severity};
use hs_hal::{CounterStorage, EventSink, ProcessorControl};
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Counter bumped and stored; the caller performs the reset.
    Performed,
    LimitReached,
}

/// Caps the number of processor resets the engine may trigger across
/// power cycles.
#[derive(Debug, Clone)]
pub struct ResetGovernor {
    counters: ResetCounters,
    default_max: u16,
}

impl ResetGovernor {
    /// Load the durable counters. Missing counters are created, corrupt ones
    /// are replaced by defaults. Both cases are written back immediately.
    pub fn load(storage: &mut dyn CounterStorage, sink: &mut dyn EventSink, default_max: u16) -> Self {
        let mut governor = Self { counters: ResetCounters::new(0, default_max), default_max };
        match storage.load() {
            Ok(Some(stored)) if stored.validate() => governor.counters = stored,
            Ok(None) => {
                governor.persist(storage);
                sink.notify(
                    Severity::Info,
                    EventId::CountersCreated,
                    format_args!("Reset counters created: max resets {}", default_max),
                );
            }
            Ok(Some(_)) | Err(_) => {
                governor.persist(storage);
                sink.notify(
                    Severity::Error,
                    EventId::CountersCorrupt,
                    format_args!("Reset counters corrupt, restored defaults (max resets {})", default_max),
                );
            }
        }
        governor
    }

    pub fn resets_performed(&self) -> u16 {
        self.counters.resets_performed
    }

    pub fn max_resets(&self) -> u16 {
        self.counters.max_resets
    }

    pub fn default_max(&self) -> u16 {
        self.default_max
    }

    pub fn try_reset(&mut self, storage: &mut dyn CounterStorage) -> ResetOutcome {
        if self.counters.resets_performed < self.counters.max_resets {
            self.counters = ResetCounters::new(self.counters.resets_performed + 1, self.counters.max_resets);
            self.persist(storage);
            ResetOutcome::Performed
        } else {
            ResetOutcome::LimitReached
        }
    }

    /// The processor-reset action shared by both monitors. On real hardware
    /// this does not return when the limit allows the reset.
    pub fn escalate(
        &mut self,
        storage: &mut dyn CounterStorage,
        processor: &mut dyn ProcessorControl,
        sink: &mut dyn EventSink,
        delay_ms: u32,
    ) -> ResetOutcome {
        let outcome = self.try_reset(storage);
        match outcome {
            ResetOutcome::Performed => {
                // Let queued notifications drain.
                processor.delay_ms(delay_ms);
                processor.disable_watchdog();
                processor.processor_reset();
            }
            ResetOutcome::LimitReached => sink.notify(
                Severity::Error,
                EventId::ResetLimit,
                format_args!(
                    "Processor Reset Action Limit Reached: No Reset Performed ({} of {})",
                    self.counters.resets_performed, self.counters.max_resets
                ),
            ),
        }
        outcome
    }

    pub fn clear_resets(&mut self, storage: &mut dyn CounterStorage) {
        self.counters = ResetCounters::new(0, self.counters.max_resets);
        self.persist(storage);
    }

    pub fn set_max_resets(&mut self, storage: &mut dyn CounterStorage, max_resets: u16) {
        self.counters = ResetCounters::new(self.counters.resets_performed, max_resets);
        self.persist(storage);
    }

    fn persist(&self, storage: &mut dyn CounterStorage) {
        if let Err(e) = storage.store(&self.counters) {
            warn!("Reset counters not stored: {:?}", e);
        }
    }
}
