use gtk::prelude::*;
use libappindicator::{AppIndicator, AppIndicatorStatus};
use std::cell::RefCell;
use std::rc::Rc;

use crate::dashboard::{Category, EnabledSet, ThemeVariant};

/// Callbacks for tray menu actions
pub struct TrayCallbacks {
    pub on_category_toggled: Box<dyn Fn(Category, bool)>,
    pub on_dark_theme_toggled: Box<dyn Fn(bool)>,
    pub on_reload: Box<dyn Fn()>,
    pub on_show_window: Box<dyn Fn()>,
    pub on_quit: Box<dyn Fn()>,
}

impl Default for TrayCallbacks {
    fn default() -> Self {
        Self {
            on_category_toggled: Box::new(|_, _| {}),
            on_dark_theme_toggled: Box::new(|_| {}),
            on_reload: Box::new(|| {}),
            on_show_window: Box::new(|| {}),
            on_quit: Box::new(|| {}),
        }
    }
}

/// Manages the system tray icon and menu
pub struct TrayManager {
    // Both must outlive the menu shown by the indicator
    _indicator: AppIndicator,
    _menu: gtk::Menu,
    callbacks: Rc<RefCell<TrayCallbacks>>,
}

impl TrayManager {
    /// Check items start out matching `enabled` and `theme`
    pub fn new(enabled: &EnabledSet, theme: ThemeVariant) -> Self {
        let mut indicator = AppIndicator::new("sysgauge", "utilities-system-monitor");
        indicator.set_status(AppIndicatorStatus::Active);
        indicator.set_title("System Dashboard");

        let mut menu = gtk::Menu::new();
        let callbacks = Rc::new(RefCell::new(TrayCallbacks::default()));

        let show_item = gtk::MenuItem::with_label("Show Dashboard");
        let callbacks_ref = callbacks.clone();
        show_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_show_window)();
        });
        menu.append(&show_item);

        menu.append(&gtk::SeparatorMenuItem::new());

        // One toggle per gauge
        for category in Category::ALL {
            let item = gtk::CheckMenuItem::with_label(category.title());
            item.set_active(enabled.is_enabled(category));
            let callbacks_ref = callbacks.clone();
            item.connect_toggled(move |item| {
                (callbacks_ref.borrow().on_category_toggled)(category, item.is_active());
            });
            menu.append(&item);
        }

        menu.append(&gtk::SeparatorMenuItem::new());

        let theme_item = gtk::CheckMenuItem::with_label("Dark Theme");
        theme_item.set_active(theme == ThemeVariant::Dark);
        let callbacks_ref = callbacks.clone();
        theme_item.connect_toggled(move |item| {
            (callbacks_ref.borrow().on_dark_theme_toggled)(item.is_active());
        });
        menu.append(&theme_item);

        let reload_item = gtk::MenuItem::with_label("Reload Now");
        let callbacks_ref = callbacks.clone();
        reload_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_reload)();
        });
        menu.append(&reload_item);

        menu.append(&gtk::SeparatorMenuItem::new());

        let quit_item = gtk::MenuItem::with_label("Quit");
        let callbacks_ref = callbacks.clone();
        quit_item.connect_activate(move |_| {
            (callbacks_ref.borrow().on_quit)();
        });
        menu.append(&quit_item);

        menu.show_all();
        indicator.set_menu(&mut menu);

        Self {
            _indicator: indicator,
            _menu: menu,
            callbacks,
        }
    }

    pub fn set_callbacks(&self, callbacks: TrayCallbacks) {
        *self.callbacks.borrow_mut() = callbacks;
    }
}
