use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use hs_hal::ProcessorControl;
use log::{error, info, warn};

/// `/dev/watchdog` style device plus a reset that takes the whole node down.
pub struct LinuxProcessor {
    watchdog: Option<File>,
}

impl LinuxProcessor {
    /// `None` runs without a hardware watchdog.
    pub fn new(device: Option<&Path>) -> anyhow::Result<Self> {
        let watchdog = match device {
            Some(path) => {
                let file = OpenOptions::new().write(true).open(path)?;
                info!(">>> [HS] Watchdog armed: {}", path.display());
                Some(file)
            }
            None => None,
        };
        Ok(Self { watchdog })
    }
}

impl ProcessorControl for LinuxProcessor {
    fn service_watchdog(&mut self) {
        if let Some(dev) = self.watchdog.as_mut() {
            if let Err(e) = dev.write_all(b"\0") {
                warn!("Watchdog service failed: {}", e);
            }
        }
    }

    fn disable_watchdog(&mut self) {
        // Magic close: the driver stops the timer on 'V' followed by close.
        if let Some(mut dev) = self.watchdog.take() {
            if let Err(e) = dev.write_all(b"V") {
                warn!("Watchdog disable failed: {}", e);
            }
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    fn processor_reset(&mut self) {
        error!(">>> [HS] PROCESSOR RESET <<<");
        log::logger().flush();
        std::process::abort();
    }
}
