use std::path::{Path, PathBuf};

use sysinfo::Disks;

use super::{MonitorError, StorageSnapshot, BYTES_PER_GB};

/// Reports capacity of the filesystem holding a given path
pub struct StorageMonitor {
    disks: Disks,
    target: PathBuf,
}

/// Capacity figures for one mounted filesystem
#[derive(Debug, Clone, PartialEq)]
struct MountUsage {
    mount_point: PathBuf,
    total_bytes: u64,
    available_bytes: u64,
}

impl StorageMonitor {
    pub fn new(target: PathBuf) -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
            target,
        }
    }

    /// Re-list mounts so that newly attached filesystems are picked up
    pub fn refresh(&mut self) {
        self.disks.refresh_list();
    }

    pub fn snapshot(&self) -> Result<StorageSnapshot, MonitorError> {
        let mounts: Vec<MountUsage> = self
            .disks
            .iter()
            .map(|disk| MountUsage {
                mount_point: disk.mount_point().to_path_buf(),
                total_bytes: disk.total_space(),
                available_bytes: disk.available_space(),
            })
            .collect();

        let mount = select_mount(&mounts, &self.target)
            .ok_or_else(|| MonitorError::NoDisk(self.target.clone()))?;
        storage_snapshot(mount)
    }
}

/// Pick the mount whose mount point is the longest prefix of `target`,
/// the same filesystem `df target` would report.
fn select_mount<'a>(mounts: &'a [MountUsage], target: &Path) -> Option<&'a MountUsage> {
    mounts
        .iter()
        .filter(|m| target.starts_with(&m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
}

fn storage_snapshot(mount: &MountUsage) -> Result<StorageSnapshot, MonitorError> {
    if mount.total_bytes == 0 {
        return Err(MonitorError::EmptyDisk(mount.mount_point.clone()));
    }

    let available = mount.available_bytes.min(mount.total_bytes);
    let free_percent = available as f64 / mount.total_bytes as f64 * 100.0;

    Ok(StorageSnapshot {
        total_gb: mount.total_bytes as f64 / BYTES_PER_GB,
        free_percent,
        used_percent: 100.0 - free_percent,
    })
}
