//! Action codes as they appear in the tables, decoded once at the table
//! boundary into sum types.

use crate::MAX_MSG_ACT_TYPES;

/// Highest AMT code that is not a Message Action.
pub const AMT_LAST_NONMSG: u16 = 3;
/// Highest EMT code that is not a Message Action.
pub const EMT_LAST_NONMSG: u16 = 3;

/// Map a flat action code onto a Message Action index.
/// `i = code - last_nonmsg - 1`, valid iff `0 <= i < max_types`.
pub fn resolve_message_action(code: u16, last_nonmsg: u16, max_types: usize) -> Option<usize> {
    let index = code.checked_sub(last_nonmsg.checked_add(1)?)? as usize;
    if index < max_types {
        Some(index)
    } else {
        None
    }
}

/// What the Application Monitor does when a slot expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    NoAction,
    ProcessorReset,
    AppRestart,
    EventOnly,
    MessageAction(usize),
    /// Out-of-range code. Counts down like any armed slot but fires nothing.
    Invalid(u16),
}

impl AppAction {
    pub fn decode(code: u16) -> Self {
        match code {
            0 => Self::NoAction,
            1 => Self::ProcessorReset,
            2 => Self::AppRestart,
            3 => Self::EventOnly,
            _ => match resolve_message_action(code, AMT_LAST_NONMSG, MAX_MSG_ACT_TYPES) {
                Some(i) => Self::MessageAction(i),
                None => Self::Invalid(code),
            },
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::NoAction => 0,
            Self::ProcessorReset => 1,
            Self::AppRestart => 2,
            Self::EventOnly => 3,
            Self::MessageAction(i) => AMT_LAST_NONMSG + 1 + i as u16,
            Self::Invalid(code) => code,
        }
    }
}

/// What the Event Monitor does when a row matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    NoAction,
    ProcessorReset,
    AppRestart,
    AppDelete,
    MessageAction(usize),
    Invalid(u16),
}

impl EventAction {
    pub fn decode(code: u16) -> Self {
        match code {
            0 => Self::NoAction,
            1 => Self::ProcessorReset,
            2 => Self::AppRestart,
            3 => Self::AppDelete,
            _ => match resolve_message_action(code, EMT_LAST_NONMSG, MAX_MSG_ACT_TYPES) {
                Some(i) => Self::MessageAction(i),
                None => Self::Invalid(code),
            },
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::NoAction => 0,
            Self::ProcessorReset => 1,
            Self::AppRestart => 2,
            Self::AppDelete => 3,
            Self::MessageAction(i) => EMT_LAST_NONMSG + 1 + i as u16,
            Self::Invalid(code) => code,
        }
    }
}
