use arrayvec::ArrayVec;

use crate::{AppName, HsError, HsResult, MAX_NAME_LEN};

pub const EVENT_MAGIC: u32 = 0x4853_4556; // "HSEV"
pub const EVENT_TEXT_MAX: usize = 122;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Error,
    Critical,
}

/// Every notification the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum EventId {
    CountersCreated = 1,
    CountersCorrupt = 2,
    ResetLimit = 3,

    AppMonFail = 10,
    AppMonResolveFail = 11,
    AppMonRestartFail = 12,
    AppMonMsgAction = 13,

    EventMonReset = 20,
    EventMonRestart = 21,
    EventMonRestartFail = 22,
    EventMonDelete = 23,
    EventMonDeleteFail = 24,
    EventMonMsgAction = 25,

    CpuHogging = 30,

    AppMonEnabled = 40,
    AppMonDisabled = 41,
    EventMonEnabled = 42,
    EventMonDisabled = 43,
    CpuHogEnabled = 44,
    CpuHogDisabled = 45,
    MsgActsEnabled = 46,
    MsgActsDisabled = 47,
    ResetsCleared = 48,
    MaxResetsSet = 49,

    TableLoaded = 60,
}

/// An event message observed on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub app_name: AppName,
    pub event_id: u16,
    pub payload: ArrayVec<u8, EVENT_TEXT_MAX>,
}

impl EventRecord {
    pub const HEADER_SIZE: usize = 4 + MAX_NAME_LEN + 2 + 2;

    pub fn new(app_name: AppName, event_id: u16) -> Self {
        Self { app_name, event_id, payload: ArrayVec::new() }
    }

    /// Returns the number of bytes written.
    pub fn to_bytes(&self, buf: &mut [u8]) -> HsResult<usize> {
        let total = Self::HEADER_SIZE + self.payload.len();
        if buf.len() < total {
            return Err(HsError::WireFormatError);
        }
        buf[0..4].copy_from_slice(&EVENT_MAGIC.to_be_bytes());
        self.app_name.write_padded(&mut buf[4..4 + MAX_NAME_LEN]);
        let at = 4 + MAX_NAME_LEN;
        buf[at..at + 2].copy_from_slice(&self.event_id.to_be_bytes());
        buf[at + 2..at + 4].copy_from_slice(&(self.payload.len() as u16).to_be_bytes());
        buf[Self::HEADER_SIZE..total].copy_from_slice(&self.payload);
        Ok(total)
    }

    pub fn from_bytes(buf: &[u8]) -> HsResult<Self> {
        if buf.len() < Self::HEADER_SIZE {
            return Err(HsError::WireFormatError);
        }
        let magic = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != EVENT_MAGIC {
            return Err(HsError::WireFormatError);
        }
        let app_name = AppName::from_padded(&buf[4..4 + MAX_NAME_LEN])?;
        let at = 4 + MAX_NAME_LEN;
        let event_id = u16::from_be_bytes([buf[at], buf[at + 1]]);
        let len = u16::from_be_bytes([buf[at + 2], buf[at + 3]]) as usize;
        let body = buf
            .get(Self::HEADER_SIZE..Self::HEADER_SIZE + len)
            .ok_or(HsError::WireFormatError)?;
        let payload = ArrayVec::try_from(body).map_err(|_| HsError::WireFormatError)?;
        Ok(Self { app_name, event_id, payload })
    }
}
