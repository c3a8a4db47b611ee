#![forbid(unsafe_code)]
use hs_core::{AppAction, AppMonEntry, EventId, HsError, Severity, MAX_MONITORED_APPS};
use hs_hal::AppHandle;

use crate::msg_action::MonitorContext;
use crate::ActionContext;

pub const ENABLE_WORDS: usize = (MAX_MONITORED_APPS + 31) / 32;

/// Check-in state of one Application Monitor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Armed { countdown: u16 },
    /// Fired (or inert). Only a refresh re-arms it.
    Expired,
}

/// Watches monitored applications for missed check-ins.
#[derive(Debug, Clone)]
pub struct AppMonitor {
    enabled: bool,
    slots: [SlotState; MAX_MONITORED_APPS],
    /// `None` until the first successful read of the slot's application.
    last_exec: [Option<u32>; MAX_MONITORED_APPS],
    enables: [u32; ENABLE_WORDS],
}

impl AppMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: [SlotState::Expired; MAX_MONITORED_APPS],
            last_exec: [None; MAX_MONITORED_APPS],
            enables: [0; ENABLE_WORDS],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Re-arm every live slot at its configured cycle count. The last
    /// observed execution counter is kept, so an app that has not moved
    /// since then keeps counting down.
    pub fn refresh(&mut self, table: &[AppMonEntry]) {
        for i in 0..MAX_MONITORED_APPS {
            match table.get(i) {
                Some(entry) if !entry.is_inert() => {
                    self.slots[i] = SlotState::Armed { countdown: entry.cycle_count };
                    self.set_bit(i);
                }
                _ => {
                    self.slots[i] = SlotState::Expired;
                    self.clear_bit(i);
                }
            }
        }
    }

    /// A new table replaces `old`. Slots now watching a different
    /// application lose their counter baseline; every slot is re-armed.
    pub fn reload(&mut self, old: &[AppMonEntry], new: &[AppMonEntry]) {
        for i in 0..MAX_MONITORED_APPS {
            let same_app = match (old.get(i), new.get(i)) {
                (Some(a), Some(b)) => a.name == b.name,
                _ => false,
            };
            if !same_app {
                self.last_exec[i] = None;
            }
        }
        self.refresh(new);
    }

    pub fn state(&self, slot: usize) -> SlotState {
        self.slots.get(slot).copied().unwrap_or(SlotState::Expired)
    }

    /// Remaining check-in cycles; zero once expired.
    pub fn countdown(&self, slot: usize) -> u16 {
        match self.state(slot) {
            SlotState::Armed { countdown } => countdown,
            SlotState::Expired => 0,
        }
    }

    pub fn enable_bits(&self) -> [u32; ENABLE_WORDS] {
        self.enables
    }

    pub fn is_slot_enabled(&self, slot: usize) -> bool {
        slot < MAX_MONITORED_APPS && self.enables[slot / 32] & (1 << (slot % 32)) != 0
    }

    /// One pass over every slot. Always completes the sweep.
    pub fn scan(&mut self, table: &[AppMonEntry], cx: &mut ActionContext<'_>) {
        for (i, entry) in table.iter().enumerate().take(MAX_MONITORED_APPS) {
            if entry.action == AppAction::NoAction {
                continue;
            }
            let countdown = match self.slots[i] {
                SlotState::Armed { countdown } => countdown,
                SlotState::Expired => continue,
            };

            // 1. Name lookup. Loud on the first miss of an armed period only.
            let handle = match cx.apps.resolve(&entry.name) {
                Ok(handle) => Some(handle),
                Err(_) => {
                    let severity = if countdown == entry.cycle_count {
                        Severity::Error
                    } else {
                        Severity::Debug
                    };
                    cx.sink.notify(
                        severity,
                        EventId::AppMonResolveFail,
                        format_args!("App Monitor App Name not found: APP:({})", entry.name),
                    );
                    None
                }
            };

            // 2. A failed counter read is "no news", not a failure.
            let counter = handle.and_then(|h| cx.apps.execution_counter(h).ok());

            // 3. Check-in?
            if let Some(value) = counter {
                if self.last_exec[i] != Some(value) {
                    self.last_exec[i] = Some(value);
                    self.slots[i] = SlotState::Armed { countdown: entry.cycle_count };
                    continue;
                }
            }

            let remaining = countdown.saturating_sub(1);
            if remaining > 0 {
                self.slots[i] = SlotState::Armed { countdown: remaining };
                continue;
            }

            self.slots[i] = SlotState::Expired;
            self.clear_bit(i);
            Self::fire(entry, handle, cx);
        }
    }

    fn fire(entry: &AppMonEntry, handle: Option<AppHandle>, cx: &mut ActionContext<'_>) {
        match entry.action {
            AppAction::ProcessorReset => {
                cx.sink.notify(
                    Severity::Error,
                    EventId::AppMonFail,
                    format_args!("App Monitor Failure: APP:({}): Action: Processor Reset", entry.name),
                );
                cx.processor_reset();
            }
            AppAction::AppRestart => {
                cx.sink.notify(
                    Severity::Error,
                    EventId::AppMonFail,
                    format_args!("App Monitor Failure: APP:({}): Action: Restart Application", entry.name),
                );
                let result = handle
                    .ok_or(HsError::NotFound)
                    .and_then(|h| cx.apps.restart(h));
                if let Err(e) = result {
                    cx.sink.notify(
                        Severity::Error,
                        EventId::AppMonRestartFail,
                        format_args!("Call to Restart App Failed: APP:({}) ERR: {}", entry.name, e),
                    );
                }
            }
            AppAction::EventOnly => {
                cx.sink.notify(
                    Severity::Error,
                    EventId::AppMonFail,
                    format_args!("App Monitor Failure: APP:({}): Action: Event Only", entry.name),
                );
            }
            AppAction::MessageAction(index) => {
                let context = MonitorContext { app_name: &entry.name, event_id: None };
                cx.message_action(index, &context);
            }
            AppAction::NoAction | AppAction::Invalid(_) => {}
        }
    }

    fn set_bit(&mut self, slot: usize) {
        self.enables[slot / 32] |= 1 << (slot % 32);
    }

    fn clear_bit(&mut self, slot: usize) {
        self.enables[slot / 32] &= !(1 << (slot % 32));
    }
}
