use std::fs;
use std::path::{Path, PathBuf};

use super::{BatteryLevel, MonitorError};

pub const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Reads battery charge from the kernel power-supply class
pub struct BatteryMonitor {
    power_supply_dir: PathBuf,
}

impl BatteryMonitor {
    pub fn new(power_supply_dir: PathBuf) -> Self {
        Self { power_supply_dir }
    }

    /// Returns the charge level, averaged when more than one battery is present
    pub fn level(&self) -> Result<BatteryLevel, MonitorError> {
        let entries = fs::read_dir(&self.power_supply_dir).map_err(|source| MonitorError::Io {
            path: self.power_supply_dir.clone(),
            source,
        })?;

        let mut levels = Vec::new();
        for entry in entries.flatten() {
            let supply = entry.path();

            // Skip AC adapters, USB ports and peripherals
            if !Self::is_system_battery(&supply) {
                continue;
            }

            levels.push(Self::read_capacity(&supply)?);
        }

        if levels.is_empty() {
            return Err(MonitorError::NoBattery(self.power_supply_dir.clone()));
        }

        let average = levels.iter().sum::<f64>() / levels.len() as f64;
        Ok(BatteryLevel::new(average))
    }

    /// A supply counts when its `type` is Battery and it powers the system
    /// (`scope` is absent or "System"; mice and headsets report "Device").
    fn is_system_battery(supply: &Path) -> bool {
        let kind = fs::read_to_string(supply.join("type")).unwrap_or_default();
        if kind.trim() != "Battery" {
            return false;
        }

        match fs::read_to_string(supply.join("scope")) {
            Ok(scope) => scope.trim().eq_ignore_ascii_case("system"),
            Err(_) => true,
        }
    }

    fn read_capacity(supply: &Path) -> Result<f64, MonitorError> {
        let path = supply.join("capacity");
        let raw = fs::read_to_string(&path).map_err(|source| MonitorError::Io {
            path: path.clone(),
            source,
        })?;

        let value = raw.trim();
        value
            .parse::<f64>()
            .map(|v| v.clamp(0.0, 100.0))
            .map_err(|_| MonitorError::Parse {
                path,
                value: value.to_string(),
            })
    }
}

impl Default for BatteryMonitor {
    fn default() -> Self {
        Self::new(PathBuf::from(POWER_SUPPLY_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_supply(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    #[test]
    fn test_reads_single_battery() {
        let root = TempDir::new().unwrap();
        add_supply(root.path(), "AC", &[("type", "Mains\n"), ("online", "1\n")]);
        add_supply(root.path(), "BAT0", &[("type", "Battery\n"), ("capacity", "55\n")]);

        let monitor = BatteryMonitor::new(root.path().to_path_buf());
        assert_eq!(monitor.level().unwrap().percent(), 55.0);
    }

    #[test]
    fn test_averages_multiple_batteries() {
        let root = TempDir::new().unwrap();
        add_supply(root.path(), "BAT0", &[("type", "Battery\n"), ("capacity", "40\n")]);
        add_supply(
            root.path(),
            "BAT1",
            &[("type", "Battery\n"), ("scope", "System\n"), ("capacity", "80\n")],
        );

        let monitor = BatteryMonitor::new(root.path().to_path_buf());
        assert_eq!(monitor.level().unwrap().percent(), 60.0);
    }

    #[test]
    fn test_ignores_peripheral_batteries() {
        let root = TempDir::new().unwrap();
        add_supply(
            root.path(),
            "hidpp_battery_0",
            &[("type", "Battery\n"), ("scope", "Device\n"), ("capacity", "12\n")],
        );

        let monitor = BatteryMonitor::new(root.path().to_path_buf());
        assert!(matches!(monitor.level(), Err(MonitorError::NoBattery(_))));
    }

    #[test]
    fn test_unparsable_capacity() {
        let root = TempDir::new().unwrap();
        add_supply(root.path(), "BAT0", &[("type", "Battery\n"), ("capacity", "full\n")]);

        let monitor = BatteryMonitor::new(root.path().to_path_buf());
        match monitor.level() {
            Err(MonitorError::Parse { value, .. }) => assert_eq!(value, "full"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_power_supply_directory() {
        let root = TempDir::new().unwrap();
        let monitor = BatteryMonitor::new(root.path().join("absent"));
        assert!(matches!(monitor.level(), Err(MonitorError::Io { .. })));
    }
}
