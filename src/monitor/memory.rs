use sysinfo::System;

use super::{MemorySnapshot, BYTES_PER_GB};

pub struct MemoryMonitor {
    system: System,
}

impl MemoryMonitor {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self { system }
    }

    pub fn refresh(&mut self) {
        self.system.refresh_memory();
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        memory_snapshot(self.system.total_memory(), self.system.used_memory())
    }
}

impl Default for MemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn memory_snapshot(total_bytes: u64, used_bytes: u64) -> MemorySnapshot {
    let used_percent = if total_bytes == 0 {
        0.0
    } else {
        used_bytes as f64 / total_bytes as f64 * 100.0
    };

    MemorySnapshot {
        total_gb: total_bytes as f64 / BYTES_PER_GB,
        used_percent,
        used_gb: used_bytes as f64 / BYTES_PER_GB,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_bytes() {
        let gb = BYTES_PER_GB as u64;
        let snapshot = memory_snapshot(8 * gb, 2 * gb);
        assert!((snapshot.total_gb - 8.0).abs() < 1e-9);
        assert!((snapshot.used_gb - 2.0).abs() < 1e-9);
        assert!((snapshot.used_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_with_no_memory_reported() {
        let snapshot = memory_snapshot(0, 0);
        assert_eq!(snapshot.used_percent, 0.0);
        assert_eq!(snapshot.total_gb, 0.0);
    }
}
