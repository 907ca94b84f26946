//! Polling lifecycle for the four metric streams.
//!
//! The dashboard loads every metric once on first activation, then keeps one
//! repeating timer per enabled category. Any change to the enabled set or the
//! intervals cancels every timer and starts a fresh set; appearance changes
//! never touch the timers.

mod category;
mod theme;
mod timer;
mod view;

use glib::ControlFlow;
use log::{debug, error, info, trace, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::monitor::{MetricsProvider, MonitorError};

pub use category::{Category, CategoryMap, ConfigError, EnabledSet, RefreshIntervals};
pub use theme::{Appearance, Color, ColorSlot, Palette, ThemeVariant};
pub use timer::{GlibTimers, TimerHost};
pub use view::{Caption, DashboardView, GaugeCard, Readings, Split, StatLabel, ViewMode};

#[cfg(test)]
pub use timer::ManualTimers;

/// Inputs owned by the host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardConfig {
    pub enabled: EnabledSet,
    pub intervals: RefreshIntervals,
    pub appearance: Appearance,
}

/// Whether the one-time load of all four metrics still has to happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialLoad {
    Pending,
    Done,
}

/// Called with the fresh view after anything visible changed
pub type ViewListener = Rc<dyn Fn(&DashboardView)>;

/// State shared between the dashboard and its timer callbacks
struct Inner<P> {
    provider: P,
    readings: Readings,
    modes: view::ViewModes,
    enabled: EnabledSet,
    appearance: Appearance,
    listener: Option<ViewListener>,
}

impl<P: MetricsProvider> Inner<P> {
    fn view(&self) -> DashboardView {
        DashboardView::build(&self.readings, &self.enabled, &self.modes, &self.appearance)
    }

    /// Fetch one category into its slot
    fn fetch(&mut self, category: Category) -> Result<(), MonitorError> {
        match category {
            Category::Storage => self.readings.storage = Some(self.provider.storage_snapshot()?),
            Category::Battery => self.readings.battery = Some(self.provider.battery_level()?),
            Category::Cpu => self.readings.cpu = Some(self.provider.cpu_snapshot()?),
            Category::Ram => self.readings.memory = Some(self.provider.memory_snapshot()?),
        }
        Ok(())
    }

    /// Fetch all four; failures leave their slot as it was
    fn load_all(&mut self) {
        for category in Category::ALL {
            if let Err(e) = self.fetch(category) {
                error!("Error loading {} data: {}", category, e);
            }
        }
    }

    fn notify(inner: &Rc<RefCell<Self>>) {
        let (view, listener) = {
            let inner = inner.borrow();
            (inner.view(), inner.listener.clone())
        };
        if let Some(listener) = listener {
            listener(&view);
        }
    }

    /// One timer tick: refresh a single category, keep the old value on failure
    fn tick(inner: &Rc<RefCell<Self>>, category: Category) {
        let result = inner.borrow_mut().fetch(category);
        match result {
            Ok(()) => {
                trace!("Refreshed {}", category);
                Self::notify(inner);
            }
            Err(e) => warn!("Skipping {} refresh: {}", category, e),
        }
    }
}

pub struct Dashboard<P: MetricsProvider + 'static, T: TimerHost> {
    inner: Rc<RefCell<Inner<P>>>,
    timers: T,
    handles: CategoryMap<Option<T::Handle>>,
    intervals: RefreshIntervals,
    initial_load: InitialLoad,
    active: bool,
    disposed: bool,
}

impl<P: MetricsProvider + 'static, T: TimerHost> Dashboard<P, T> {
    pub fn new(provider: P, timers: T, config: DashboardConfig, initial_load: InitialLoad) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                provider,
                readings: Readings::default(),
                modes: view::ViewModes::default(),
                enabled: config.enabled,
                appearance: config.appearance,
                listener: None,
            })),
            timers,
            handles: CategoryMap::default(),
            intervals: config.intervals,
            initial_load,
            active: false,
            disposed: false,
        }
    }

    pub fn set_listener(&mut self, listener: impl Fn(&DashboardView) + 'static) {
        self.inner.borrow_mut().listener = Some(Rc::new(listener));
    }

    /// Load everything once (first activation only) and start polling
    pub fn activate(&mut self) {
        if self.disposed {
            warn!("Ignoring activation of a disposed dashboard");
            return;
        }

        if self.initial_load == InitialLoad::Pending {
            self.initial_load = InitialLoad::Done;
            info!("Loading initial system data");
            self.inner.borrow_mut().load_all();
        }

        self.active = true;
        self.restart_timers();
        Inner::notify(&self.inner);
    }

    /// Apply a new host configuration.
    ///
    /// A changed enabled set or interval table restarts every timer; a
    /// changed appearance only re-renders.
    pub fn reconfigure(&mut self, config: DashboardConfig) {
        let polling_changed = {
            let mut inner = self.inner.borrow_mut();
            let changed = inner.enabled != config.enabled || self.intervals != config.intervals;
            inner.enabled = config.enabled;
            inner.appearance = config.appearance;
            changed
        };
        self.intervals = config.intervals;

        if polling_changed && self.active && !self.disposed {
            self.restart_timers();
        }
        Inner::notify(&self.inner);
    }

    pub fn config(&self) -> DashboardConfig {
        let inner = self.inner.borrow();
        DashboardConfig {
            enabled: inner.enabled,
            intervals: self.intervals,
            appearance: inner.appearance.clone(),
        }
    }

    pub fn set_enabled(&mut self, category: Category, enabled: bool) {
        let mut config = self.config();
        *config.enabled.get_mut(category) = enabled;
        self.reconfigure(config);
    }

    pub fn set_theme(&mut self, theme: ThemeVariant) {
        let mut config = self.config();
        config.appearance.theme = theme;
        self.reconfigure(config);
    }

    /// Fetch all four metrics again, outside the one-shot initial load
    pub fn reload(&mut self) {
        if self.disposed {
            return;
        }
        info!("Reloading system data");
        self.inner.borrow_mut().load_all();
        Inner::notify(&self.inner);
    }

    /// Switch a storage/RAM gauge between used and free. Never refetches.
    pub fn set_view_mode(&mut self, split: Split, mode: ViewMode) {
        self.inner.borrow_mut().modes.set(split, mode);
        Inner::notify(&self.inner);
    }

    #[cfg(test)]
    pub fn view_mode(&self, split: Split) -> ViewMode {
        self.inner.borrow().modes.get(split)
    }

    #[cfg(test)]
    pub fn view(&self) -> DashboardView {
        self.inner.borrow().view()
    }

    #[cfg(test)]
    pub fn readings(&self) -> Readings {
        self.inner.borrow().readings.clone()
    }

    /// Categories that currently have a running timer
    #[cfg(test)]
    pub fn polling(&self) -> Vec<Category> {
        self.handles.iter().filter(|(_, h)| h.is_some()).map(|(c, _)| c).collect()
    }

    /// Cancel every timer for good. No fetch happens afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_timers();
        self.active = false;
        self.disposed = true;
        debug!("Dashboard disposed");
    }

    fn cancel_timers(&mut self) {
        for category in Category::ALL {
            if let Some(handle) = self.handles.get_mut(category).take() {
                debug!("Stopping {} timer", category);
                self.timers.cancel(handle);
            }
        }
    }

    fn restart_timers(&mut self) {
        self.cancel_timers();

        let enabled = self.inner.borrow().enabled;
        for category in enabled.enabled() {
            let weak: Weak<RefCell<Inner<P>>> = Rc::downgrade(&self.inner);
            let handle = self.timers.start(
                category,
                self.intervals.get(category),
                Box::new(move || match weak.upgrade() {
                    Some(inner) => {
                        Inner::tick(&inner, category);
                        ControlFlow::Continue
                    }
                    None => ControlFlow::Break,
                }),
            );
            *self.handles.get_mut(category) = Some(handle);
        }

        debug_assert!(
            Category::ALL
                .into_iter()
                .all(|c| enabled.is_enabled(c) == self.handles.get(c).is_some()),
            "timer table out of sync with enabled set"
        );
    }
}

impl<P: MetricsProvider + 'static, T: TimerHost> Drop for Dashboard<P, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{BatteryLevel, CpuSnapshot, MemorySnapshot, StorageSnapshot};
    use std::cell::Cell;
    use std::time::Duration;

    /// Per-category call counters and failure switches, shared with the test
    #[derive(Default)]
    struct Script {
        calls: CategoryMap<Cell<usize>>,
        failing: CategoryMap<Cell<bool>>,
        cpu_usage: Cell<f64>,
    }

    impl Script {
        fn calls(&self, category: Category) -> usize {
            self.calls.get(category).get()
        }

        fn total_calls(&self) -> usize {
            Category::ALL.into_iter().map(|c| self.calls(c)).sum()
        }

        fn fail(&self, category: Category, failing: bool) {
            self.failing.get(category).set(failing);
        }
    }

    struct ScriptedProvider(Rc<Script>);

    impl ScriptedProvider {
        fn call(&self, category: Category) -> Result<(), MonitorError> {
            let counter = self.0.calls.get(category);
            counter.set(counter.get() + 1);
            if self.0.failing.get(category).get() {
                Err(MonitorError::NoBattery("/nowhere".into()))
            } else {
                Ok(())
            }
        }
    }

    impl MetricsProvider for ScriptedProvider {
        fn storage_snapshot(&mut self) -> Result<StorageSnapshot, MonitorError> {
            self.call(Category::Storage)?;
            Ok(StorageSnapshot {
                total_gb: 64.0,
                free_percent: 40.0,
                used_percent: 60.0,
            })
        }

        fn battery_level(&mut self) -> Result<BatteryLevel, MonitorError> {
            self.call(Category::Battery)?;
            Ok(BatteryLevel::new(55.0))
        }

        fn memory_snapshot(&mut self) -> Result<MemorySnapshot, MonitorError> {
            self.call(Category::Ram)?;
            Ok(MemorySnapshot {
                total_gb: 8.0,
                used_percent: 50.0,
                used_gb: 4.0,
            })
        }

        fn cpu_snapshot(&mut self) -> Result<CpuSnapshot, MonitorError> {
            self.call(Category::Cpu)?;
            Ok(CpuSnapshot {
                usage_percent: self.0.cpu_usage.get(),
            })
        }
    }

    type TestDashboard = Dashboard<ScriptedProvider, ManualTimers>;

    fn config(enabled: EnabledSet) -> DashboardConfig {
        DashboardConfig {
            enabled,
            ..DashboardConfig::default()
        }
    }

    fn dashboard(enabled: EnabledSet) -> (TestDashboard, Rc<Script>, ManualTimers) {
        let script = Rc::new(Script::default());
        let timers = ManualTimers::default();
        let dashboard = Dashboard::new(
            ScriptedProvider(script.clone()),
            timers.clone(),
            config(enabled),
            InitialLoad::Pending,
        );
        (dashboard, script, timers)
    }

    fn enabled(categories: &[Category]) -> EnabledSet {
        EnabledSet::from_fn(|c| categories.contains(&c))
    }

    #[test]
    fn test_one_timer_per_enabled_category_for_every_combination() {
        for mask in 0u8..16 {
            let set = EnabledSet::from_fn(|c| {
                let bit = Category::ALL.iter().position(|x| *x == c).unwrap();
                mask & (1 << bit) != 0
            });
            let (mut dash, _script, timers) = dashboard(set);
            dash.activate();

            let expected: Vec<Category> = set.enabled().collect();
            assert_eq!(timers.active(), expected, "mask {:04b}", mask);
            assert_eq!(dash.polling(), expected, "mask {:04b}", mask);
        }
    }

    #[test]
    fn test_timers_use_configured_intervals() {
        let (mut dash, _script, timers) = dashboard(EnabledSet::all(true));
        dash.activate();
        assert_eq!(timers.interval_of(Category::Battery), Some(Duration::from_millis(30_000)));
        assert_eq!(timers.interval_of(Category::Storage), Some(Duration::from_millis(600_000)));
        assert_eq!(timers.interval_of(Category::Cpu), Some(Duration::from_millis(2_000)));
        assert_eq!(timers.interval_of(Category::Ram), Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn test_initial_load_fetches_everything_once() {
        let (mut dash, script, _timers) = dashboard(enabled(&[Category::Battery]));
        dash.activate();
        for category in Category::ALL {
            assert_eq!(script.calls(category), 1, "{}", category);
        }

        // Re-activation must not load again
        dash.activate();
        assert_eq!(script.total_calls(), 4);
    }

    #[test]
    fn test_initial_load_can_be_skipped() {
        let script = Rc::new(Script::default());
        let mut dash = Dashboard::new(
            ScriptedProvider(script.clone()),
            ManualTimers::default(),
            config(EnabledSet::all(true)),
            InitialLoad::Done,
        );
        dash.activate();
        assert_eq!(script.total_calls(), 0);
        assert!(dash.view().is_loading());
    }

    #[test]
    fn test_tick_fetches_only_its_category() {
        let (mut dash, script, timers) = dashboard(EnabledSet::all(true));
        dash.activate();

        script.cpu_usage.set(42.0);
        assert_eq!(timers.fire(Category::Cpu), 1);

        assert_eq!(script.calls(Category::Cpu), 2);
        assert_eq!(script.calls(Category::Ram), 1);
        assert_eq!(script.calls(Category::Storage), 1);
        assert_eq!(script.calls(Category::Battery), 1);
        assert_eq!(dash.view().card(Category::Cpu).unwrap().center_text, "42%");
    }

    #[test]
    fn test_dispose_stops_all_fetching() {
        let (mut dash, script, timers) = dashboard(EnabledSet::all(true));
        dash.activate();
        timers.fire_all();
        let frozen = script.total_calls();

        dash.dispose();
        assert!(timers.active().is_empty());
        assert!(dash.polling().is_empty());
        assert_eq!(timers.fire_all(), 0);

        dash.activate();
        dash.reload();
        assert!(timers.active().is_empty());
        assert_eq!(script.total_calls(), frozen);
    }

    #[test]
    fn test_drop_cancels_timers() {
        let (mut dash, script, timers) = dashboard(EnabledSet::all(true));
        dash.activate();
        drop(dash);
        assert!(timers.active().is_empty());
        assert_eq!(timers.fire_all(), 0);
        assert_eq!(script.total_calls(), 4);
    }

    #[test]
    fn test_enabling_cpu_restarts_every_timer() {
        let (mut dash, _script, timers) =
            dashboard(enabled(&[Category::Storage, Category::Battery, Category::Ram]));
        dash.activate();
        assert_eq!(
            timers.started(),
            vec![Category::Storage, Category::Battery, Category::Ram]
        );

        dash.set_enabled(Category::Cpu, true);

        assert_eq!(timers.active(), Category::ALL.to_vec());
        assert_eq!(
            timers.started(),
            vec![
                Category::Storage,
                Category::Battery,
                Category::Ram,
                Category::Storage,
                Category::Battery,
                Category::Cpu,
                Category::Ram,
            ]
        );
        let cpu_starts = timers.started().iter().filter(|c| **c == Category::Cpu).count();
        assert_eq!(cpu_starts, 1);
    }

    #[test]
    fn test_disabling_category_stops_its_timer() {
        let (mut dash, _script, timers) = dashboard(EnabledSet::all(true));
        dash.activate();
        dash.set_enabled(Category::Ram, false);
        assert_eq!(
            timers.active(),
            vec![Category::Storage, Category::Battery, Category::Cpu]
        );
        assert!(dash.view().card(Category::Ram).is_none());
    }

    #[test]
    fn test_interval_change_restarts_with_new_period() {
        let (mut dash, _script, timers) = dashboard(enabled(&[Category::Cpu]));
        dash.activate();

        let mut cfg = dash.config();
        cfg.intervals.set(Category::Cpu, Duration::from_millis(750)).unwrap();
        dash.reconfigure(cfg);

        assert_eq!(timers.active(), vec![Category::Cpu]);
        assert_eq!(timers.interval_of(Category::Cpu), Some(Duration::from_millis(750)));
        assert_eq!(timers.started().len(), 2);
    }

    #[test]
    fn test_theme_change_keeps_timers() {
        let (mut dash, script, timers) = dashboard(EnabledSet::all(true));
        dash.activate();
        dash.set_theme(ThemeVariant::Dark);
        assert_eq!(timers.started().len(), 4);
        assert_eq!(script.total_calls(), 4);
        assert_eq!(
            dash.view().card(Category::Cpu).unwrap().color.to_hex(),
            "#FF9F0A"
        );
    }

    #[test]
    fn test_view_toggle_does_not_fetch() {
        let (mut dash, script, _timers) = dashboard(EnabledSet::all(true));
        dash.activate();
        let before = script.total_calls();

        dash.set_view_mode(Split::Storage, ViewMode::Free);
        assert_eq!(dash.view().card(Category::Storage).unwrap().percent, 40.0);
        dash.set_view_mode(Split::Ram, ViewMode::Free);
        assert_eq!(dash.view().card(Category::Ram).unwrap().percent, 50.0);
        assert_eq!(dash.view_mode(Split::Ram), ViewMode::Free);

        dash.set_view_mode(Split::Storage, ViewMode::Used);
        assert_eq!(dash.view().card(Category::Storage).unwrap().percent, 60.0);
        assert_eq!(script.total_calls(), before);
    }

    #[test]
    fn test_storage_and_battery_scenario() {
        let (mut dash, _script, _timers) =
            dashboard(enabled(&[Category::Storage, Category::Battery]));
        dash.activate();

        let view = dash.view();
        let storage = view.card(Category::Storage).unwrap();
        assert_eq!(storage.percent, 60.0);
        assert_eq!(storage.center_text, "64.00 GB");
        assert_eq!(view.card(Category::Battery).unwrap().percent, 55.0);
        assert!(view.card(Category::Cpu).is_none());
        assert!(view.card(Category::Ram).is_none());
    }

    #[test]
    fn test_failed_storage_load_leaves_battery_visible() {
        let (mut dash, script, _timers) =
            dashboard(enabled(&[Category::Storage, Category::Battery]));
        script.fail(Category::Storage, true);
        dash.activate();

        let view = dash.view();
        assert!(!view.is_loading());
        assert_eq!(view.card(Category::Battery).unwrap().percent, 55.0);
        assert!(view.card(Category::Storage).is_none());

        // Manual reload recovers once the provider does
        script.fail(Category::Storage, false);
        dash.reload();
        assert!(dash.view().card(Category::Storage).is_some());
    }

    #[test]
    fn test_total_initial_failure_stays_loading() {
        let (mut dash, script, _timers) = dashboard(EnabledSet::all(true));
        for category in Category::ALL {
            script.fail(category, true);
        }
        dash.activate();
        assert!(dash.view().is_loading());
        assert_eq!(dash.polling(), Category::ALL.to_vec());
    }

    #[test]
    fn test_failed_tick_keeps_previous_value_and_keeps_polling() {
        let (mut dash, script, timers) = dashboard(enabled(&[Category::Battery, Category::Cpu]));
        script.cpu_usage.set(10.0);
        dash.activate();

        script.fail(Category::Cpu, true);
        script.cpu_usage.set(90.0);
        assert_eq!(timers.fire(Category::Cpu), 1);
        assert_eq!(dash.readings().cpu.unwrap().usage_percent, 10.0);
        assert_eq!(timers.active(), vec![Category::Battery, Category::Cpu]);

        script.fail(Category::Cpu, false);
        timers.fire(Category::Cpu);
        assert_eq!(dash.readings().cpu.unwrap().usage_percent, 90.0);
    }

    #[test]
    fn test_category_enabled_late_appears_after_first_poll() {
        let script = Rc::new(Script::default());
        let timers = ManualTimers::default();
        let mut dash = Dashboard::new(
            ScriptedProvider(script.clone()),
            timers.clone(),
            config(enabled(&[Category::Battery])),
            InitialLoad::Pending,
        );
        script.fail(Category::Ram, true);
        dash.activate();

        script.fail(Category::Ram, false);
        dash.set_enabled(Category::Ram, true);
        assert!(dash.view().card(Category::Ram).is_none());

        timers.fire(Category::Ram);
        assert!(dash.view().card(Category::Ram).is_some());
    }

    #[test]
    fn test_listener_sees_updates() {
        let (mut dash, _script, timers) = dashboard(enabled(&[Category::Battery, Category::Cpu]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        dash.set_listener(move |view| sink.borrow_mut().push(view.clone()));

        dash.activate();
        timers.fire(Category::Cpu);
        dash.set_view_mode(Split::Ram, ViewMode::Free);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|v| !v.is_loading()));
    }
}
