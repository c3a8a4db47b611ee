#![cfg(feature = "std")]

use crate::backend::StorageBackend;
use hs_core::{HsError, HsResult};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::format;
use std::vec::Vec;

/// Critical data store on a local filesystem: one file per block under
/// `root`, replaced atomically so a reset mid-write leaves the old block.
pub struct FileSystemBackend {
    root: PathBuf,
}

fn failed<E>(_: E) -> HsError {
    HsError::StorageFailure
}

impl FileSystemBackend {
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn block_path(&self, id: u32) -> PathBuf {
        self.root.join(format!("cds_{:08x}.bin", id))
    }
}

impl StorageBackend for FileSystemBackend {
    fn write(&mut self, id: u32, data: &[u8]) -> HsResult<()> {
        let target = self.block_path(id);
        let staging = target.with_extension("tmp");

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)
            .map_err(failed)?;
        file.write_all(data).map_err(failed)?;
        // Contents must be durable before the rename publishes them.
        file.sync_all().map_err(failed)?;
        drop(file);

        fs::rename(&staging, &target).map_err(failed)?;
        if let Ok(dir) = File::open(&self.root) {
            let _ = dir.sync_all();
        }
        Ok(())
    }

    fn read(&self, id: u32) -> HsResult<Vec<u8>> {
        let mut file = File::open(self.block_path(id)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => HsError::NotFound,
            _ => HsError::StorageFailure,
        })?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(failed)?;
        Ok(buf)
    }

    fn delete(&mut self, id: u32) -> HsResult<()> {
        match fs::remove_file(self.block_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(_) => Err(HsError::StorageFailure),
        }
    }

    fn exists(&self, id: u32) -> bool {
        self.block_path(id).exists()
    }
}
