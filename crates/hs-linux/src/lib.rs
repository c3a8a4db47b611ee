//! Linux adapters for the Health & Safety engine.

pub mod bus;
pub mod config;
pub mod cpu;
pub mod process;
pub mod processor;
pub mod sink;
pub mod tables;

pub use bus::UdpBus;
pub use config::TableFile;
pub use cpu::ProcStatSampler;
pub use process::{ProcessRegistry, ProcessSpec};
pub use processor::LinuxProcessor;
pub use sink::LogSink;
pub use tables::FileTables;

use hs_core::HsError;

/// Platform status for a failed OS call.
pub(crate) fn os_status(e: &std::io::Error) -> HsError {
    HsError::OsStatus(e.raw_os_error().unwrap_or(-1))
}
