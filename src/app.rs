use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::Settings;
use crate::dashboard::{Dashboard, GlibTimers, InitialLoad, ThemeVariant};
use crate::monitor::SystemMonitor;
use crate::ui::{DashboardWindow, TrayCallbacks, TrayManager, WindowCallbacks};

type SystemDashboard = Dashboard<SystemMonitor, GlibTimers>;

/// Main application state
pub struct App {
    dashboard: Rc<RefCell<SystemDashboard>>,
    window: Option<DashboardWindow>,
    tray: Option<TrayManager>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let monitor = SystemMonitor::new(&settings.monitor);
        let dashboard =
            Dashboard::new(monitor, GlibTimers, settings.dashboard, InitialLoad::Pending);

        Self {
            dashboard: Rc::new(RefCell::new(dashboard)),
            window: None,
            tray: None,
        }
    }

    /// Open the dashboard window (and the tray icon if requested), then start polling
    pub fn start(app: Rc<RefCell<Self>>, with_tray: bool) {
        let dashboard = app.borrow().dashboard.clone();
        let window = DashboardWindow::new(with_tray);

        // The listener only touches widgets, never the dashboard
        let window_ref = window.clone();
        dashboard.borrow_mut().set_listener(move |view| window_ref.update(view));

        let dashboard_weak = Rc::downgrade(&dashboard);
        window.set_callbacks(WindowCallbacks {
            on_view_selected: {
                let dashboard_weak = dashboard_weak.clone();
                Box::new(move |split, mode| {
                    with_dashboard(&dashboard_weak, |d| d.set_view_mode(split, mode));
                })
            },
            on_reload: {
                let dashboard_weak = dashboard_weak.clone();
                Box::new(move || with_dashboard(&dashboard_weak, |d| d.reload()))
            },
        });

        if with_tray {
            let config = dashboard.borrow().config();
            let tray = TrayManager::new(&config.enabled, config.appearance.theme);

            tray.set_callbacks(TrayCallbacks {
                on_category_toggled: {
                    let dashboard_weak = dashboard_weak.clone();
                    Box::new(move |category, enabled| {
                        let state = if enabled { "enabled" } else { "disabled" };
                        info!("{} gauge {}", category, state);
                        with_dashboard(&dashboard_weak, |d| d.set_enabled(category, enabled));
                    })
                },
                on_dark_theme_toggled: {
                    let dashboard_weak = dashboard_weak.clone();
                    Box::new(move |dark| {
                        let theme = if dark { ThemeVariant::Dark } else { ThemeVariant::Light };
                        with_dashboard(&dashboard_weak, |d| d.set_theme(theme));
                    })
                },
                on_reload: {
                    let dashboard_weak = dashboard_weak.clone();
                    Box::new(move || with_dashboard(&dashboard_weak, |d| d.reload()))
                },
                on_show_window: {
                    let window = window.clone();
                    Box::new(move || window.show())
                },
                on_quit: Box::new(|| {
                    gtk::main_quit();
                }),
            });

            app.borrow_mut().tray = Some(tray);
        }

        window.show();
        app.borrow_mut().window = Some(window);

        dashboard.borrow_mut().activate();
    }

    /// Start polling without any widgets; every view is logged instead
    pub fn start_headless(app: Rc<RefCell<Self>>) {
        let dashboard = app.borrow().dashboard.clone();
        let mut dashboard = dashboard.borrow_mut();
        dashboard.set_listener(|view| info!("{}", view.summary()));
        dashboard.activate();
    }

    /// Clean shutdown
    pub fn shutdown(&mut self) {
        if let Some(window) = self.window.take() {
            window.hide();
        }
        if self.tray.take().is_some() {
            debug!("Tray icon removed");
        }
        match self.dashboard.try_borrow_mut() {
            Ok(mut dashboard) => dashboard.dispose(),
            Err(_) => warn!("Dashboard busy during shutdown, timers end with the main loop"),
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn with_dashboard(
    dashboard: &Weak<RefCell<SystemDashboard>>,
    f: impl FnOnce(&mut SystemDashboard),
) {
    if let Some(dashboard) = dashboard.upgrade() {
        match dashboard.try_borrow_mut() {
            Ok(mut dashboard) => f(&mut dashboard),
            Err(_) => warn!("Dashboard busy, ignoring request"),
        }
    }
}
