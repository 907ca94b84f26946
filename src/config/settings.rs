use ini::{Ini, Properties};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dashboard::{
    Category, Color, ColorSlot, ConfigError, DashboardConfig, Palette, RefreshIntervals,
    ThemeVariant,
};
use crate::monitor::MonitorSettings;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Ini(#[from] ini::Error),
    #[error("[{section}] {key} = {value:?} is not a valid {expected}")]
    InvalidValue {
        section: &'static str,
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Interval(#[from] ConfigError),
}

/// Everything read from `settings.ini`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub dashboard: DashboardConfig,
    pub monitor: MonitorSettings,
}

impl Settings {
    /// `~/.config/sysgauge/settings.ini`
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("sysgauge/settings.ini"))
    }

    /// Load settings from a file; a missing file means defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        log::info!("Loaded settings from {}", path.display());
        Self::from_ini(&ini)
    }

    #[cfg(test)]
    pub fn from_ini_str(content: &str) -> Result<Self, SettingsError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        let dashboard = &mut settings.dashboard;

        if let Some(section) = ini.section(Some("widgets")) {
            for (key, value) in section.iter() {
                let Some(category) = category_key("widgets", key) else { continue };
                *dashboard.enabled.get_mut(category) = parse_bool("widgets", key, value)?;
            }
        }

        if let Some(section) = ini.section(Some("intervals")) {
            let mut overrides = Vec::new();
            for (key, value) in section.iter() {
                let Some(category) = category_key("intervals", key) else { continue };
                let millis: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("intervals", key, value, "interval in milliseconds"))?;
                overrides.push((category, Duration::from_millis(millis)));
            }
            dashboard.intervals = RefreshIntervals::with_overrides(overrides)?;
        }

        if let Some(section) = ini.section(Some("appearance")) {
            if let Some(theme) = section.get("theme") {
                dashboard.appearance.theme = theme
                    .parse()
                    .map_err(|_| invalid("appearance", "theme", theme, "theme (light or dark)"))?;
            }
        }

        if let Some(section) = ini.section(Some("colors")) {
            for (key, value) in section.iter() {
                match ColorSlot::ALL.into_iter().find(|slot| slot.key() == key) {
                    Some(slot) => dashboard
                        .appearance
                        .overrides
                        .set(slot, Some(parse_color("colors", key, value)?)),
                    None => log::warn!("Ignoring unknown colour slot [colors] {}", key),
                }
            }
        }

        if let Some(section) = ini.section(Some("palette")) {
            let palette = parse_palette(section, dashboard.appearance.theme)?;
            dashboard.appearance.custom_palette = Some(palette);
        }

        if let Some(section) = ini.section(Some("monitor")) {
            if let Some(path) = section.get("storage_path") {
                settings.monitor.storage_path = PathBuf::from(path.trim());
            }
            if let Some(path) = section.get("power_supply_dir") {
                settings.monitor.power_supply_dir = PathBuf::from(path.trim());
            }
        }

        Ok(settings)
    }
}

/// A custom palette replaces the theme entirely: surface colours default to
/// the selected theme, accents only exist where the file names them.
fn parse_palette(section: &Properties, theme: ThemeVariant) -> Result<Palette, SettingsError> {
    let base = theme.palette();
    let color = |key: &str| -> Result<Option<Color>, SettingsError> {
        section
            .get(key)
            .map(|value| parse_color("palette", key, value))
            .transpose()
    };

    Ok(Palette {
        background: color("background")?.unwrap_or(base.background),
        card: color("card")?.unwrap_or(base.card),
        text: color("text")?.unwrap_or(base.text),
        track: color("track")?.unwrap_or(base.track),
        used: color("used")?,
        free: color("free")?,
        battery: color("battery")?,
        cpu: color("cpu")?,
        ram_used: color("ram_used")?,
    })
}

fn category_key(section: &str, key: &str) -> Option<Category> {
    match key.parse() {
        Ok(category) => Some(category),
        Err(e) => {
            log::warn!("Ignoring [{}] {}: {}", section, key, e);
            None
        }
    }
}

fn invalid(section: &'static str, key: &str, value: &str, expected: &'static str) -> SettingsError {
    SettingsError::InvalidValue {
        section,
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_bool(section: &'static str, key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(section, key, value, "boolean")),
    }
}

fn parse_color(section: &'static str, key: &str, value: &str) -> Result<Color, SettingsError> {
    value.parse().map_err(|_| invalid(section, key, value, "colour"))
}
