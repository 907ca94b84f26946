mod battery;
mod cpu;
mod memory;
mod storage;

use std::path::PathBuf;

pub use battery::BatteryMonitor;
pub use cpu::CpuMonitor;
pub use memory::MemoryMonitor;
pub use storage::StorageMonitor;

/// Bytes in one gigabyte as reported on the gauges (binary, 1024^3)
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Disk usage summary for the filesystem being watched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageSnapshot {
    pub total_gb: f64,
    pub free_percent: f64,
    pub used_percent: f64,
}

/// Battery charge, 0 to 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryLevel(f64);

impl BatteryLevel {
    pub fn new(percent: f64) -> Self {
        Self(percent)
    }

    pub fn percent(&self) -> f64 {
        self.0
    }
}

/// RAM usage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySnapshot {
    pub total_gb: f64,
    pub used_percent: f64,
    pub used_gb: f64,
}

impl MemorySnapshot {
    pub fn free_gb(&self) -> f64 {
        self.total_gb - self.used_gb
    }

    pub fn free_percent(&self) -> f64 {
        100.0 - self.used_percent
    }
}

/// Averaged CPU load across all cores, nominally 0 to 100
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuSnapshot {
    pub usage_percent: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("no CPU usage data available")]
    NoCpus,
    #[error("no mounted filesystem contains {0}")]
    NoDisk(PathBuf),
    #[error("filesystem at {0} reports zero capacity")]
    EmptyDisk(PathBuf),
    #[error("no battery found under {0}")]
    NoBattery(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected value {value:?} in {path}")]
    Parse { path: PathBuf, value: String },
}

/// The four point-in-time readings the dashboard polls.
///
/// Every call is synchronous and independent of the others; a failing
/// reading never affects the rest.
pub trait MetricsProvider {
    fn storage_snapshot(&mut self) -> Result<StorageSnapshot, MonitorError>;
    fn battery_level(&mut self) -> Result<BatteryLevel, MonitorError>;
    fn memory_snapshot(&mut self) -> Result<MemorySnapshot, MonitorError>;
    fn cpu_snapshot(&mut self) -> Result<CpuSnapshot, MonitorError>;
}

/// Where the system monitor looks for its data
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    /// Path whose filesystem is reported as "storage"
    pub storage_path: PathBuf,
    /// Kernel power-supply class directory
    pub power_supply_dir: PathBuf,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("/"),
            power_supply_dir: PathBuf::from(battery::POWER_SUPPLY_DIR),
        }
    }
}

/// Central monitor that reads the live system
pub struct SystemMonitor {
    cpu: CpuMonitor,
    memory: MemoryMonitor,
    storage: StorageMonitor,
    battery: BatteryMonitor,
}

impl SystemMonitor {
    pub fn new(settings: &MonitorSettings) -> Self {
        let cpu = CpuMonitor::new();
        log::debug!(
            "System monitor: {} CPU cores, storage at {}, batteries under {}",
            cpu.core_count(),
            settings.storage_path.display(),
            settings.power_supply_dir.display()
        );

        Self {
            cpu,
            memory: MemoryMonitor::new(),
            storage: StorageMonitor::new(settings.storage_path.clone()),
            battery: BatteryMonitor::new(settings.power_supply_dir.clone()),
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(&MonitorSettings::default())
    }
}

impl MetricsProvider for SystemMonitor {
    fn storage_snapshot(&mut self) -> Result<StorageSnapshot, MonitorError> {
        self.storage.refresh();
        self.storage.snapshot()
    }

    fn battery_level(&mut self) -> Result<BatteryLevel, MonitorError> {
        self.battery.level()
    }

    fn memory_snapshot(&mut self) -> Result<MemorySnapshot, MonitorError> {
        self.memory.refresh();
        Ok(self.memory.snapshot())
    }

    fn cpu_snapshot(&mut self) -> Result<CpuSnapshot, MonitorError> {
        self.cpu.refresh();
        self.cpu.snapshot()
    }
}
