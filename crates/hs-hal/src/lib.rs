#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
use alloc::sync::Arc;

use hs_core::{
    AppMonEntry, AppName, EventId, EventMonEntry, EventRecord, HsError, HsResult,
    MessageActionEntry, ResetCounters, Severity,
};

/// Opaque handle to a live application, valid until the next lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AppHandle(pub u32);

/// Name lookup and lifecycle control over the monitored applications.
pub trait AppControl {
    fn resolve(&mut self, name: &AppName) -> HsResult<AppHandle>;

    /// Monotonic counter that advances while the application makes progress.
    fn execution_counter(&mut self, handle: AppHandle) -> HsResult<u32>;

    fn restart(&mut self, handle: AppHandle) -> HsResult<()>;

    fn delete(&mut self, handle: AppHandle) -> HsResult<()>;
}

/// The software bus.
/// INVARIANT: Must be Non-Blocking.
pub trait MessageBus {
    /// Transmit a pre-built, pre-addressed message verbatim.
    fn send(&mut self, message: &[u8]) -> nb::Result<usize, HsError>;

    /// Next queued event message. `WouldBlock` when the queue is empty.
    fn receive_event(&mut self) -> nb::Result<EventRecord, HsError>;
}

/// Durable storage for the reset counters (survives a processor reset).
pub trait CounterStorage {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&mut self) -> HsResult<Option<ResetCounters>>;

    /// Store values and complements as one atomic write.
    fn store(&mut self, counters: &ResetCounters) -> HsResult<()>;
}

/// CPU utilization sampling (board specific).
pub trait UtilizationSource {
    /// Utilization over the last interval in `0..=UTIL_MAX`, `None` when unavailable.
    fn sample(&mut self) -> Option<u32>;
}

/// Watchdog and reset control.
pub trait ProcessorControl {
    fn service_watchdog(&mut self);

    fn disable_watchdog(&mut self);

    fn delay_ms(&mut self, ms: u32);

    /// Reset the processor. Real hardware never returns from this.
    fn processor_reset(&mut self);
}

/// Event/notification output.
pub trait EventSink {
    fn notify(&mut self, severity: Severity, id: EventId, text: core::fmt::Arguments<'_>);
}

/// New table contents published by the table service.
/// `None` means that table is unchanged.
#[derive(Debug, Clone, Default)]
pub struct TableUpdate {
    pub app_monitor: Option<Arc<[AppMonEntry]>>,
    pub event_monitor: Option<Arc<[EventMonEntry]>>,
    pub message_actions: Option<Arc<[MessageActionEntry]>>,
}

impl TableUpdate {
    pub fn is_empty(&self) -> bool {
        self.app_monitor.is_none() && self.event_monitor.is_none() && self.message_actions.is_none()
    }
}

/// Table load/registration service. Polled once per cycle at the
/// reacquisition barrier, never mid-scan.
pub trait TableService {
    fn poll_update(&mut self) -> Option<TableUpdate>;
}
