#![forbid(unsafe_code)]
use hs_core::{AppName, EventId, MessageActionEntry, MsgActState, Severity};
use hs_hal::{EventSink, MessageBus};
use log::warn;

use crate::cooldown::CooldownTracker;

/// Who asked for the Message Action. Cited in the notification.
#[derive(Debug, Clone, Copy)]
pub struct MonitorContext<'a> {
    pub app_name: &'a AppName,
    /// Set when the request comes from the Event Monitor.
    pub event_id: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Suppressed,
}

/// Shared Message Action dispatch for both monitors.
#[derive(Debug, Clone)]
pub struct MessageActions {
    enabled: bool,
    cooldown: CooldownTracker,
    executed: u16,
}

impl MessageActions {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, cooldown: CooldownTracker::new(), executed: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Once per cycle, before any monitor runs.
    pub fn tick(&mut self) {
        self.cooldown.tick();
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    /// New Message Actions Table: nothing is cooling any more.
    pub fn reset_cooldowns(&mut self) {
        self.cooldown.clear();
    }

    pub fn executed(&self) -> u16 {
        self.executed
    }

    pub fn dispatch(
        &mut self,
        table: &[MessageActionEntry],
        index: usize,
        context: &MonitorContext<'_>,
        bus: &mut dyn MessageBus,
        sink: &mut dyn EventSink,
    ) -> DispatchOutcome {
        if !self.enabled {
            return DispatchOutcome::Suppressed;
        }
        let entry = match table.get(index) {
            Some(entry) => entry,
            None => return DispatchOutcome::Suppressed,
        };
        if self.cooldown.is_cooling(index) || entry.state == MsgActState::Disabled {
            return DispatchOutcome::Suppressed;
        }

        if let Err(e) = bus.send(&entry.payload) {
            warn!("Message Action {} transmit failed: {:?}", index, e);
        }
        self.executed = self.executed.wrapping_add(1);
        self.cooldown.arm(index, entry.cooldown);

        if entry.state != MsgActState::EnabledNoEvent {
            match context.event_id {
                Some(eid) => sink.notify(
                    Severity::Error,
                    EventId::EventMonMsgAction,
                    format_args!(
                        "Event Monitor Msg Action {} sent: APP:({}) EID:({})",
                        index, context.app_name, eid
                    ),
                ),
                None => sink.notify(
                    Severity::Error,
                    EventId::AppMonMsgAction,
                    format_args!("App Monitor Msg Action {} sent: APP:({})", index, context.app_name),
                ),
            }
        }
        DispatchOutcome::Sent
    }
}
