use crate::{HsError, HsResult};

/// Reset bookkeeping that survives a processor reset.
/// Every value travels with its bitwise complement so a torn or corrupted
/// write is detectable on the next boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetCounters {
    pub resets_performed: u16,
    pub resets_performed_not: u16,
    pub max_resets: u16,
    pub max_resets_not: u16,
}

impl ResetCounters {
    pub const SIZE: usize = 8;

    pub fn new(resets_performed: u16, max_resets: u16) -> Self {
        Self {
            resets_performed,
            resets_performed_not: !resets_performed,
            max_resets,
            max_resets_not: !max_resets,
        }
    }

    /// Both shadows match their values.
    pub fn validate(&self) -> bool {
        self.resets_performed_not == !self.resets_performed
            && self.max_resets_not == !self.max_resets
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..2].copy_from_slice(&self.resets_performed.to_be_bytes());
        buf[2..4].copy_from_slice(&self.resets_performed_not.to_be_bytes());
        buf[4..6].copy_from_slice(&self.max_resets.to_be_bytes());
        buf[6..8].copy_from_slice(&self.max_resets_not.to_be_bytes());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> HsResult<Self> {
        if buf.len() != Self::SIZE {
            return Err(HsError::Corrupt);
        }
        let word = |at: usize| u16::from_be_bytes([buf[at], buf[at + 1]]);
        Ok(Self {
            resets_performed: word(0),
            resets_performed_not: word(2),
            max_resets: word(4),
            max_resets_not: word(6),
        })
    }
}
