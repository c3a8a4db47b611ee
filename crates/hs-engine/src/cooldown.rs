#![forbid(unsafe_code)]
use hs_core::MAX_MSG_ACT_TYPES;

/// Per-slot countdown gating Message Actions.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    remaining: [u16; MAX_MSG_ACT_TYPES],
}

impl CooldownTracker {
    pub const fn new() -> Self {
        Self { remaining: [0; MAX_MSG_ACT_TYPES] }
    }

    /// Whole-array sweep, once per cycle. Floors at zero.
    pub fn tick(&mut self) {
        for slot in self.remaining.iter_mut() {
            *slot = slot.saturating_sub(1);
        }
    }

    pub fn remaining(&self, index: usize) -> u16 {
        self.remaining.get(index).copied().unwrap_or(0)
    }

    pub fn is_cooling(&self, index: usize) -> bool {
        self.remaining(index) != 0
    }

    pub(crate) fn arm(&mut self, index: usize, period: u16) {
        if let Some(slot) = self.remaining.get_mut(index) {
            *slot = period;
        }
    }

    pub fn clear(&mut self) {
        self.remaining = [0; MAX_MSG_ACT_TYPES];
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new()
    }
}
