use hs_core::{EventId, Severity};
use hs_hal::EventSink;
use log::{debug, error, info};

/// Routes engine notifications into the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&mut self, severity: Severity, id: EventId, text: core::fmt::Arguments<'_>) {
        let code = id as u16;
        match severity {
            Severity::Critical | Severity::Error => error!("[HS:{:03}] {}", code, text),
            Severity::Info => info!("[HS:{:03}] {}", code, text),
            Severity::Debug => debug!("[HS:{:03}] {}", code, text),
        }
    }
}
