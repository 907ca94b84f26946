//! Gauge view models derived from the latest readings

use super::category::{Category, EnabledSet};
use super::theme::{Appearance, Color, ColorSlot, Palette};
use crate::monitor::{BatteryLevel, CpuSnapshot, MemorySnapshot, StorageSnapshot};

/// Most recent value per category; replaced wholesale on every fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings {
    pub storage: Option<StorageSnapshot>,
    pub battery: Option<BatteryLevel>,
    pub memory: Option<MemorySnapshot>,
    pub cpu: Option<CpuSnapshot>,
}

impl Readings {
    /// Gauges stay behind the loading placeholder until one of these arrives.
    /// Either one is enough, so a machine without a battery still shows gauges.
    pub fn has_required(&self) -> bool {
        self.storage.is_some() || self.battery.is_some()
    }
}

/// Categories with a used/free selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Storage,
    Ram,
}

impl Split {
    /// The selector belonging to a card, if it has one
    pub fn for_category(category: Category) -> Option<Self> {
        match category {
            Category::Storage => Some(Self::Storage),
            Category::Ram => Some(Self::Ram),
            Category::Battery | Category::Cpu => None,
        }
    }
}

impl ViewMode {
    pub fn toggled(&self) -> Self {
        match self {
            Self::Used => Self::Free,
            Self::Free => Self::Used,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Used,
    Free,
}

/// Used/free choice for each split category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewModes {
    pub storage: ViewMode,
    pub ram: ViewMode,
}

impl ViewModes {
    pub fn get(&self, split: Split) -> ViewMode {
        match split {
            Split::Storage => self.storage,
            Split::Ram => self.ram,
        }
    }

    pub fn set(&mut self, split: Split, mode: ViewMode) {
        match split {
            Split::Storage => self.storage = mode,
            Split::Ram => self.ram = mode,
        }
    }
}

/// One side of a used/free selector
#[derive(Debug, Clone, PartialEq)]
pub struct StatLabel {
    pub text: String,
    pub color: Color,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Caption {
    Label(&'static str),
    Split {
        split: Split,
        used: StatLabel,
        free: StatLabel,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeCard {
    pub category: Category,
    pub title: &'static str,
    /// Filled share of the ring, 0 to 100
    pub percent: f64,
    pub center_text: String,
    pub color: Color,
    pub caption: Caption,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Loading,
    Ready { palette: Palette, cards: Vec<GaugeCard> },
}

impl DashboardView {
    pub fn build(
        readings: &Readings,
        enabled: &EnabledSet,
        modes: &ViewModes,
        appearance: &Appearance,
    ) -> Self {
        if !readings.has_required() {
            return Self::Loading;
        }

        let palette = appearance.palette();
        let cards = enabled
            .enabled()
            .filter_map(|category| match category {
                Category::Storage => readings
                    .storage
                    .map(|s| storage_card(&s, modes.storage, appearance, &palette)),
                Category::Battery => readings.battery.map(|b| battery_card(b, appearance)),
                Category::Cpu => readings.cpu.map(|c| cpu_card(c, appearance)),
                Category::Ram => readings
                    .memory
                    .map(|m| ram_card(&m, modes.ram, appearance, &palette)),
            })
            .collect();

        Self::Ready { palette, cards }
    }

    #[cfg(test)]
    pub fn card(&self, category: Category) -> Option<&GaugeCard> {
        match self {
            Self::Loading => None,
            Self::Ready { cards, .. } => cards.iter().find(|c| c.category == category),
        }
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// One-line text rendering, used by headless mode
    pub fn summary(&self) -> String {
        match self {
            Self::Loading => "Loading...".to_string(),
            Self::Ready { cards, .. } if cards.is_empty() => "No widgets enabled".to_string(),
            Self::Ready { cards, .. } => cards
                .iter()
                .map(|card| match &card.caption {
                    Caption::Label(_) => format!("{}: {}", card.title, card.center_text),
                    Caption::Split { used, free, .. } => format!(
                        "{}: {} of {} ({}, {})",
                        card.title,
                        format_percent(card.percent),
                        card.center_text,
                        used.text,
                        free.text
                    ),
                })
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

fn format_percent(percent: f64) -> String {
    format!("{:.0}%", percent)
}

fn split_caption(
    split: Split,
    mode: ViewMode,
    used_text: String,
    free_text: String,
    colors: (Color, Color),
    palette: &Palette,
) -> Caption {
    let (used_color, free_color) = colors;
    Caption::Split {
        split,
        used: StatLabel {
            text: used_text,
            color: if mode == ViewMode::Used { used_color } else { palette.text },
            active: mode == ViewMode::Used,
        },
        free: StatLabel {
            text: free_text,
            color: if mode == ViewMode::Free { free_color } else { palette.text },
            active: mode == ViewMode::Free,
        },
    }
}

fn storage_card(
    storage: &StorageSnapshot,
    mode: ViewMode,
    appearance: &Appearance,
    palette: &Palette,
) -> GaugeCard {
    let used_color = appearance.resolve(ColorSlot::StorageUsed);
    let free_color = appearance.resolve(ColorSlot::StorageFree);
    let (percent, color) = match mode {
        ViewMode::Used => (storage.used_percent, used_color),
        ViewMode::Free => (storage.free_percent, free_color),
    };

    GaugeCard {
        category: Category::Storage,
        title: Category::Storage.title(),
        percent,
        center_text: format!("{:.2} GB", storage.total_gb),
        color,
        caption: split_caption(
            Split::Storage,
            mode,
            format!("Used: {:.2}%", storage.used_percent),
            format!("Free: {:.2}%", storage.free_percent),
            (used_color, free_color),
            palette,
        ),
    }
}

fn battery_card(battery: BatteryLevel, appearance: &Appearance) -> GaugeCard {
    GaugeCard {
        category: Category::Battery,
        title: Category::Battery.title(),
        percent: battery.percent(),
        center_text: format!("{:.0}%", battery.percent()),
        color: appearance.resolve(ColorSlot::Battery),
        caption: Caption::Label("Charge"),
    }
}

fn cpu_card(cpu: CpuSnapshot, appearance: &Appearance) -> GaugeCard {
    GaugeCard {
        category: Category::Cpu,
        title: Category::Cpu.title(),
        percent: cpu.usage_percent,
        center_text: format!("{:.0}%", cpu.usage_percent),
        color: appearance.resolve(ColorSlot::Cpu),
        caption: Caption::Label("Current Load"),
    }
}

fn ram_card(
    memory: &MemorySnapshot,
    mode: ViewMode,
    appearance: &Appearance,
    palette: &Palette,
) -> GaugeCard {
    let used_color = appearance.resolve(ColorSlot::RamUsed);
    let free_color = appearance.resolve(ColorSlot::RamFree);
    let (percent, color) = match mode {
        ViewMode::Used => (memory.used_percent, used_color),
        ViewMode::Free => (memory.free_percent(), free_color),
    };

    GaugeCard {
        category: Category::Ram,
        title: Category::Ram.title(),
        percent,
        center_text: format!("{:.1} GB", memory.total_gb),
        color,
        caption: split_caption(
            Split::Ram,
            mode,
            format!("Used: {:.1} GB", memory.used_gb),
            format!("Free: {:.1} GB", memory.free_gb()),
            (used_color, free_color),
            palette,
        ),
    }
}
