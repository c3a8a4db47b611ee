use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hs_hal::{TableService, TableUpdate};
use log::{info, warn};

use crate::config::TableFile;

/// Table service backed by the node's TOML file. The file is re-read when
/// its modification time changes; a rejected file leaves the active tables
/// in place.
pub struct FileTables {
    path: PathBuf,
    seen: Option<SystemTime>,
}

impl FileTables {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), seen: None }
    }

    /// Parse and validate all three tables; all or nothing.
    pub fn read_tables(path: &Path) -> anyhow::Result<TableUpdate> {
        let file = TableFile::load(path)?;
        Ok(TableUpdate {
            app_monitor: Some(file.app_monitor_table()?.into()),
            event_monitor: Some(file.event_monitor_table()?.into()),
            message_actions: Some(file.message_action_table()?.into()),
        })
    }
}

impl TableService for FileTables {
    fn poll_update(&mut self) -> Option<TableUpdate> {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => return None,
        };
        if self.seen == Some(modified) {
            return None;
        }
        self.seen = Some(modified);

        match Self::read_tables(&self.path) {
            Ok(update) => {
                info!("[HS] Tables loaded from {}", self.path.display());
                Some(update)
            }
            Err(e) => {
                warn!("[HS] Rejected {}: {:#}", self.path.display(), e);
                None
            }
        }
    }
}
