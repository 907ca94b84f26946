use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The four metric streams the dashboard knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Storage,
    Battery,
    Cpu,
    Ram,
}

impl Category {
    /// Display order of the cards
    pub const ALL: [Category; 4] = [Self::Storage, Self::Battery, Self::Cpu, Self::Ram];

    /// Key used in the settings file and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Battery => "battery",
            Self::Cpu => "cpu",
            Self::Ram => "ram",
        }
    }

    /// Card title
    pub fn title(&self) -> &'static str {
        match self {
            Self::Storage => "Storage",
            Self::Battery => "Battery",
            Self::Cpu => "CPU Usage",
            Self::Ram => "RAM Usage",
        }
    }

    pub fn default_interval(&self) -> Duration {
        match self {
            Self::Storage => Duration::from_millis(600_000),
            Self::Battery => Duration::from_millis(30_000),
            Self::Cpu => Duration::from_millis(2_000),
            Self::Ram => Duration::from_millis(5_000),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown metric category {0:?} (expected storage, battery, cpu or ram)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// One value per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryMap<T> {
    pub storage: T,
    pub battery: T,
    pub cpu: T,
    pub ram: T,
}

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            storage: f(Category::Storage),
            battery: f(Category::Battery),
            cpu: f(Category::Cpu),
            ram: f(Category::Ram),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Storage => &self.storage,
            Category::Battery => &self.battery,
            Category::Cpu => &self.cpu,
            Category::Ram => &self.ram,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Storage => &mut self.storage,
            Category::Battery => &mut self.battery,
            Category::Cpu => &mut self.cpu,
            Category::Ram => &mut self.ram,
        }
    }

    /// Iterate in display order
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Which categories poll and render. Owned by the host, never by the dashboard.
pub type EnabledSet = CategoryMap<bool>;

impl EnabledSet {
    pub fn all(enabled: bool) -> Self {
        Self::from_fn(|_| enabled)
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        *self.get(category)
    }

    pub fn enabled(&self) -> impl Iterator<Item = Category> + '_ {
        self.iter().filter(|(_, on)| **on).map(|(c, _)| c)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("refresh interval for {0} must be at least 1 ms")]
    ZeroInterval(Category),
    #[error("refresh interval for {0} must be at most 4294967295 ms")]
    IntervalTooLong(Category),
}

/// Longest period the GLib main loop can represent
const MAX_INTERVAL_MS: u128 = u32::MAX as u128;

/// Per-category polling period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals(CategoryMap<Duration>);

impl RefreshIntervals {
    pub fn get(&self, category: Category) -> Duration {
        *self.0.get(category)
    }

    /// Override one category. The period must be a whole number of
    /// milliseconds between 1 and `MAX_INTERVAL_MS` after truncation.
    pub fn set(&mut self, category: Category, interval: Duration) -> Result<(), ConfigError> {
        let millis = interval.as_millis();
        if millis == 0 {
            return Err(ConfigError::ZeroInterval(category));
        }
        if millis > MAX_INTERVAL_MS {
            return Err(ConfigError::IntervalTooLong(category));
        }
        *self.0.get_mut(category) = interval;
        Ok(())
    }

    /// Defaults with a partial set of overrides applied
    pub fn with_overrides(
        overrides: impl IntoIterator<Item = (Category, Duration)>,
    ) -> Result<Self, ConfigError> {
        let mut intervals = Self::default();
        for (category, interval) in overrides {
            intervals.set(category, interval)?;
        }
        Ok(intervals)
    }
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self(CategoryMap::from_fn(|c| c.default_interval()))
    }
}
