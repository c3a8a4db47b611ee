use std::process::{Child, Command, Stdio};

use hs_core::{AppName, HsError, HsResult};
use hs_hal::{AppControl, AppHandle};
use log::{info, warn};

use crate::os_status;

/// How to (re)start one supervised application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub name: AppName,
    pub command: String,
    pub args: Vec<String>,
}

impl ProcessSpec {
    fn spawn(&self) -> std::io::Result<Child> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .spawn()
    }
}

struct Supervised {
    spec: ProcessSpec,
    child: Option<Child>,
}

/// Child processes standing in for the monitored applications.
/// Handles are registry indices; a handle stays valid across restarts.
///
/// The check-in signal is the child's context-switch count. Supervised
/// programs must wake periodically (a timer, a heartbeat) for it to mean
/// anything: a child blocked on input looks hung, and a busy loop that is
/// preempted keeps looking alive.
#[derive(Default)]
pub struct ProcessRegistry {
    procs: Vec<Supervised>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, spec: ProcessSpec) -> anyhow::Result<()> {
        let child = spec.spawn()?;
        info!("[HS] Started {} (pid {})", spec.name, child.id());
        self.procs.push(Supervised { spec, child: Some(child) });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn pid(&self, handle: AppHandle) -> Option<u32> {
        self.procs.get(handle.0 as usize)?.child.as_ref().map(|c| c.id())
    }

    pub fn shutdown(&mut self) {
        for proc in &mut self.procs {
            if let Some(mut child) = proc.child.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }

    fn entry(&mut self, handle: AppHandle) -> HsResult<&mut Supervised> {
        self.procs.get_mut(handle.0 as usize).ok_or(HsError::NotFound)
    }

    fn stop(proc: &mut Supervised) -> HsResult<()> {
        if let Some(mut child) = proc.child.take() {
            match child.kill() {
                Ok(()) => {}
                // Already exited.
                Err(ref e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
                Err(e) => {
                    proc.child = Some(child);
                    return Err(os_status(&e));
                }
            }
            child.wait().map_err(|e| os_status(&e))?;
        }
        Ok(())
    }
}

impl Drop for ProcessRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl AppControl for ProcessRegistry {
    fn resolve(&mut self, name: &AppName) -> HsResult<AppHandle> {
        let index = self
            .procs
            .iter()
            .position(|p| p.spec.name == *name)
            .ok_or(HsError::NotFound)?;
        let proc = &mut self.procs[index];
        let child = proc.child.as_mut().ok_or(HsError::NotFound)?;
        match child.try_wait() {
            Ok(None) => Ok(AppHandle(index as u32)),
            Ok(Some(status)) => {
                warn!("[HS] {} exited: {}", proc.spec.name, status);
                proc.child = None;
                Err(HsError::NotFound)
            }
            Err(e) => Err(os_status(&e)),
        }
    }

    fn execution_counter(&mut self, handle: AppHandle) -> HsResult<u32> {
        let pid = self.pid(handle).ok_or(HsError::NotFound)?;
        let status = std::fs::read_to_string(format!("/proc/{}/status", pid))
            .map_err(|e| os_status(&e))?;
        context_switches(&status)
            .map(|n| n as u32)
            .ok_or(HsError::WireFormatError)
    }

    fn restart(&mut self, handle: AppHandle) -> HsResult<()> {
        let proc = self.entry(handle)?;
        Self::stop(proc)?;
        let child = proc.spec.spawn().map_err(|e| os_status(&e))?;
        info!("[HS] Restarted {} (pid {})", proc.spec.name, child.id());
        proc.child = Some(child);
        Ok(())
    }

    fn delete(&mut self, handle: AppHandle) -> HsResult<()> {
        let proc = self.entry(handle)?;
        Self::stop(proc)?;
        info!("[HS] Deleted {}", proc.spec.name);
        Ok(())
    }
}

/// Voluntary plus involuntary context switches from `/proc/<pid>/status`.
/// Any scheduling activity counts as progress.
pub fn context_switches(status: &str) -> Option<u64> {
    let field = |key: &str| -> Option<u64> {
        status
            .lines()
            .find_map(|l| l.strip_prefix(key))?
            .trim()
            .parse()
            .ok()
    };
    Some(field("voluntary_ctxt_switches:")? + field("nonvoluntary_ctxt_switches:")?)
}
