#![forbid(unsafe_code)]
extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use hs_core::{HsError, HsResult};

/// Abstract interface for Non-Volatile Memory (NVM).
pub trait StorageBackend: Send + Sync {
    /// Atomically write data to a specific ID/Address.
    /// MUST ensure data is flushed to physical media before returning.
    fn write(&mut self, id: u32, data: &[u8]) -> HsResult<()>;

    /// Read data back. `NotFound` if the ID was never written.
    fn read(&self, id: u32) -> HsResult<Vec<u8>>;

    /// Delete/Trim data.
    fn delete(&mut self, id: u32) -> HsResult<()>;

    /// Verify if ID exists.
    fn exists(&self, id: u32) -> bool;
}

/// RAM-only backend. Survives nothing; used for bring-up and tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blocks: BTreeMap<u32, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn write(&mut self, id: u32, data: &[u8]) -> HsResult<()> {
        self.blocks.insert(id, data.to_vec());
        Ok(())
    }

    fn read(&self, id: u32) -> HsResult<Vec<u8>> {
        self.blocks.get(&id).cloned().ok_or(HsError::NotFound)
    }

    fn delete(&mut self, id: u32) -> HsResult<()> {
        self.blocks.remove(&id);
        Ok(())
    }

    fn exists(&self, id: u32) -> bool {
        self.blocks.contains_key(&id)
    }
}
