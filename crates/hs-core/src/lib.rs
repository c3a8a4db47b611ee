#![no_std]
#[cfg(feature = "std")]
extern crate std;

pub mod action;
pub mod counters;
pub mod event;
pub mod name;
pub mod table;

pub use action::{resolve_message_action, AppAction, EventAction};
pub use counters::ResetCounters;
pub use event::{EventId, EventRecord, Severity};
pub use name::AppName;
pub use table::{
    validate_app_monitor_table, validate_event_monitor_table, validate_message_action_table,
    AppMonEntry, EventMonEntry, MessageActionEntry, MsgActState, MsgPayload, TableValidation,
};

/// Application Monitor Table capacity (slots).
pub const MAX_MONITORED_APPS: usize = 32;
/// Event Monitor Table capacity (rows).
pub const MAX_MONITORED_EVENTS: usize = 16;
/// Message Actions Table capacity.
pub const MAX_MSG_ACT_TYPES: usize = 8;
/// Largest pre-built message a Message Action may carry.
pub const MAX_MSG_ACT_SIZE: usize = 16;
/// Bounded application name length (bytes).
pub const MAX_NAME_LEN: usize = 20;

/// Utilization history depth (N).
pub const UTIL_HISTORY_LEN: usize = 16;
/// Full scale of a utilization sample (hundredths of a percent).
pub const UTIL_MAX: u32 = 10_000;
/// Reported in place of average/peak when the sample source has nothing.
pub const UTIL_UNAVAILABLE: u32 = 0xFFFF_FFFF;

pub type HsResult<T> = Result<T, HsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HsError {
    Generic,
    InvalidState,
    NotFound,
    HalError,
    WireFormatError,
    StorageFailure,
    Corrupt,
    InvalidTable,
    /// Raw status code reported by the platform.
    OsStatus(i32),
}

impl core::fmt::Display for HsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HsError {}
