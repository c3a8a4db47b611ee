use arrayvec::ArrayVec;

use crate::{
    AppAction, AppName, EventAction, HsError, HsResult, MAX_MONITORED_APPS, MAX_MONITORED_EVENTS,
    MAX_MSG_ACT_SIZE, MAX_MSG_ACT_TYPES,
};

pub type MsgPayload = ArrayVec<u8, MAX_MSG_ACT_SIZE>;

/// Application Monitor Table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppMonEntry {
    pub name: AppName,
    /// Cycles allowed between check-ins. Zero marks the slot unused.
    pub cycle_count: u16,
    pub action: AppAction,
}

impl AppMonEntry {
    pub fn new(name: &str, cycle_count: u16, action_code: u16) -> HsResult<Self> {
        Ok(Self {
            name: AppName::new(name)?,
            cycle_count,
            action: AppAction::decode(action_code),
        })
    }

    /// An inert slot never counts down.
    pub fn is_inert(&self) -> bool {
        self.cycle_count == 0 || self.action == AppAction::NoAction
    }
}

/// Event Monitor Table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMonEntry {
    pub app_name: AppName,
    pub event_id: u16,
    pub action: EventAction,
}

impl EventMonEntry {
    pub fn new(app_name: &str, event_id: u16, action_code: u16) -> HsResult<Self> {
        Ok(Self {
            app_name: AppName::new(app_name)?,
            event_id,
            action: EventAction::decode(action_code),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgActState {
    Disabled,
    Enabled,
    /// Sends without the accompanying notification.
    EnabledNoEvent,
}

impl MsgActState {
    pub fn decode(code: u8) -> HsResult<Self> {
        match code {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Enabled),
            2 => Ok(Self::EnabledNoEvent),
            _ => Err(HsError::InvalidTable),
        }
    }
}

/// Message Actions Table row: a pre-built, pre-addressed bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageActionEntry {
    pub state: MsgActState,
    /// Minimum cycles between sends.
    pub cooldown: u16,
    pub payload: MsgPayload,
}

impl MessageActionEntry {
    pub fn new(state: MsgActState, cooldown: u16, payload: &[u8]) -> HsResult<Self> {
        let payload = MsgPayload::try_from(payload).map_err(|_| HsError::InvalidTable)?;
        Ok(Self { state, cooldown, payload })
    }
}

/// Outcome of a table validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableValidation {
    pub good: usize,
    pub bad: usize,
    pub unused: usize,
    pub first_bad: Option<usize>,
}

impl TableValidation {
    pub fn is_valid(&self) -> bool {
        self.bad == 0
    }

    fn record(&mut self, index: usize, verdict: Verdict) {
        match verdict {
            Verdict::Good => self.good += 1,
            Verdict::Unused => self.unused += 1,
            Verdict::Bad => {
                self.bad += 1;
                if self.first_bad.is_none() {
                    self.first_bad = Some(index);
                }
            }
        }
    }
}

enum Verdict {
    Good,
    Bad,
    Unused,
}

pub fn validate_app_monitor_table(rows: &[AppMonEntry]) -> HsResult<TableValidation> {
    if rows.len() > MAX_MONITORED_APPS {
        return Err(HsError::InvalidTable);
    }
    let mut result = TableValidation::default();
    for (i, row) in rows.iter().enumerate() {
        let verdict = match row.action {
            AppAction::Invalid(_) => Verdict::Bad,
            _ if row.is_inert() => Verdict::Unused,
            _ if row.name.is_empty() => Verdict::Bad,
            _ => Verdict::Good,
        };
        result.record(i, verdict);
    }
    Ok(result)
}

pub fn validate_event_monitor_table(rows: &[EventMonEntry]) -> HsResult<TableValidation> {
    if rows.len() > MAX_MONITORED_EVENTS {
        return Err(HsError::InvalidTable);
    }
    let mut result = TableValidation::default();
    for (i, row) in rows.iter().enumerate() {
        let verdict = match row.action {
            EventAction::Invalid(_) => Verdict::Bad,
            EventAction::NoAction => Verdict::Unused,
            _ if row.app_name.is_empty() => Verdict::Bad,
            _ => Verdict::Good,
        };
        result.record(i, verdict);
    }
    Ok(result)
}

pub fn validate_message_action_table(rows: &[MessageActionEntry]) -> HsResult<TableValidation> {
    if rows.len() > MAX_MSG_ACT_TYPES {
        return Err(HsError::InvalidTable);
    }
    let mut result = TableValidation::default();
    for (i, row) in rows.iter().enumerate() {
        let verdict = match row.state {
            MsgActState::Disabled => Verdict::Unused,
            _ if row.payload.is_empty() => Verdict::Bad,
            _ => Verdict::Good,
        };
        result.record(i, verdict);
    }
    Ok(result)
}
