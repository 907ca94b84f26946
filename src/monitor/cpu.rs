use std::time::{Duration, Instant};
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

use super::{CpuSnapshot, MonitorError};

pub struct CpuMonitor {
    system: System,
    last_refresh: Instant,
}

impl CpuMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        // Initial refresh to get baseline
        system.refresh_cpu_usage();
        Self {
            system,
            last_refresh: Instant::now(),
        }
    }

    /// Waits out the rest of sysinfo's minimum interval when called too soon
    /// after the previous refresh (only the startup load does that).
    pub fn refresh(&mut self) {
        if let Some(wait) = remaining_wait(self.last_refresh.elapsed()) {
            log::debug!("Waiting {:?} for a meaningful CPU sample", wait);
            std::thread::sleep(wait);
        }
        self.system.refresh_cpu_usage();
        self.last_refresh = Instant::now();
    }

    /// Returns CPU usage averaged across all cores, in percent
    pub fn snapshot(&self) -> Result<CpuSnapshot, MonitorError> {
        let usages: Vec<f32> = self.system.cpus().iter().map(|cpu| cpu.cpu_usage()).collect();
        average_usage(&usages)
            .map(|usage_percent| CpuSnapshot { usage_percent })
            .ok_or(MonitorError::NoCpus)
    }

    /// Returns the number of CPU cores
    pub fn core_count(&self) -> usize {
        self.system.cpus().len()
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn remaining_wait(since_last_refresh: Duration) -> Option<Duration> {
    MINIMUM_CPU_UPDATE_INTERVAL
        .checked_sub(since_last_refresh)
        .filter(|wait| !wait.is_zero())
}

fn average_usage(per_core: &[f32]) -> Option<f64> {
    if per_core.is_empty() {
        return None;
    }
    let total: f32 = per_core.iter().sum();
    Some((total / per_core.len() as f32) as f64)
}
