#![no_std]
#[cfg(feature = "std")]
extern crate std;

pub mod backend;
#[cfg(feature = "std")]
pub mod fs_backend;

extern crate alloc;
use alloc::boxed::Box;

use backend::StorageBackend;
use hs_core::{HsError, HsResult, ResetCounters};
use hs_hal::CounterStorage;
use log::debug;

/// Block ID of the reset counters record.
pub const RESET_COUNTERS_ID: u32 = 0x4853_0001;

/// The durable reset counters, kept as one block so value and complement
/// always land in the same atomic write.
pub struct CounterStore {
    backend: Box<dyn StorageBackend>,
    id: u32,
}

impl CounterStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self::with_id(backend, RESET_COUNTERS_ID)
    }

    pub fn with_id(backend: Box<dyn StorageBackend>, id: u32) -> Self {
        Self { backend, id }
    }

    /// Forget the stored record (next load reports nothing stored).
    pub fn erase(&mut self) -> HsResult<()> {
        self.backend.delete(self.id)
    }
}

impl CounterStorage for CounterStore {
    fn load(&mut self) -> HsResult<Option<ResetCounters>> {
        match self.backend.read(self.id) {
            Ok(raw) => ResetCounters::from_bytes(&raw).map(Some),
            Err(HsError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&mut self, counters: &ResetCounters) -> HsResult<()> {
        debug!(
            "Storing reset counters: performed={} max={}",
            counters.resets_performed, counters.max_resets
        );
        self.backend.write(self.id, &counters.to_bytes())
    }
}
