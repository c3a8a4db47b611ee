#![forbid(unsafe_code)]
use hs_core::{EventAction, EventId, EventMonEntry, EventRecord, Severity};

use crate::msg_action::MonitorContext;
use crate::ActionContext;

/// Matches inbound event messages against the Event Monitor Table.
/// Holds no per-event state between calls.
#[derive(Debug, Clone)]
pub struct EventMonitor {
    enabled: bool,
    events_monitored: u32,
    invalid_events: u32,
}

impl EventMonitor {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, events_monitored: 0, invalid_events: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn events_monitored(&self) -> u32 {
        self.events_monitored
    }

    pub fn invalid_events(&self) -> u32 {
        self.invalid_events
    }

    /// An event arrived that could not be decoded.
    pub fn note_invalid(&mut self) {
        self.invalid_events = self.invalid_events.wrapping_add(1);
    }

    /// Every matching row fires, in table order.
    pub fn monitor_event(&mut self, table: &[EventMonEntry], record: &EventRecord, cx: &mut ActionContext<'_>) {
        if !self.enabled {
            return;
        }
        self.events_monitored = self.events_monitored.wrapping_add(1);

        for entry in table {
            if entry.action == EventAction::NoAction
                || entry.event_id != record.event_id
                || entry.app_name != record.app_name
            {
                continue;
            }
            Self::fire(entry, cx);
        }
    }

    fn fire(entry: &EventMonEntry, cx: &mut ActionContext<'_>) {
        let name = &entry.app_name;
        let eid = entry.event_id;
        match entry.action {
            EventAction::ProcessorReset => {
                cx.sink.notify(
                    Severity::Error,
                    EventId::EventMonReset,
                    format_args!("Event Monitor: APP:({}) EID:({}): Action: Processor Reset", name, eid),
                );
                cx.processor_reset();
            }
            EventAction::AppRestart => {
                let result = cx.apps.resolve(name).and_then(|handle| {
                    cx.sink.notify(
                        Severity::Error,
                        EventId::EventMonRestart,
                        format_args!("Event Monitor: APP:({}) EID:({}): Action: Restart Application", name, eid),
                    );
                    cx.apps.restart(handle)
                });
                if let Err(e) = result {
                    cx.sink.notify(
                        Severity::Error,
                        EventId::EventMonRestartFail,
                        format_args!("Call to Restart App Failed: APP:({}) ERR: {}", name, e),
                    );
                }
            }
            EventAction::AppDelete => {
                let result = cx.apps.resolve(name).and_then(|handle| {
                    cx.sink.notify(
                        Severity::Error,
                        EventId::EventMonDelete,
                        format_args!("Event Monitor: APP:({}) EID:({}): Action: Delete Application", name, eid),
                    );
                    cx.apps.delete(handle)
                });
                if let Err(e) = result {
                    cx.sink.notify(
                        Severity::Error,
                        EventId::EventMonDeleteFail,
                        format_args!("Call to Delete App Failed: APP:({}) ERR: {}", name, e),
                    );
                }
            }
            EventAction::MessageAction(index) => {
                let context = MonitorContext { app_name: name, event_id: Some(eid) };
                cx.message_action(index, &context);
            }
            EventAction::NoAction | EventAction::Invalid(_) => {}
        }
    }
}
