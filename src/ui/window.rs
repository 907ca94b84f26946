use gdk::keys::constants as key;
use gtk::prelude::*;
use gtk::{
    Align, Box as GtkBox, Button, CssProvider, DrawingArea, Label, Orientation, ReliefStyle,
    ScrolledWindow, Window, WindowPosition, WindowType,
};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

use super::gauge::{render_gauge, GAUGE_SIZE};
use crate::dashboard::{
    Caption, Category, CategoryMap, DashboardView, GaugeCard, Palette, Split, StatLabel, ViewMode,
};

/// Callbacks for window actions
pub struct WindowCallbacks {
    pub on_view_selected: Box<dyn Fn(Split, ViewMode)>,
    pub on_reload: Box<dyn Fn()>,
}

impl Default for WindowCallbacks {
    fn default() -> Self {
        Self {
            on_view_selected: Box::new(|_, _| {}),
            on_reload: Box::new(|| {}),
        }
    }
}

/// Widgets of one gauge card
#[derive(Clone)]
struct CardWidgets {
    root: GtkBox,
    title: Label,
    gauge: DrawingArea,
    caption: Label,
    split_box: GtkBox,
    used_label: Label,
    free_label: Label,
    /// What the draw handler paints
    state: Rc<RefCell<Option<(GaugeCard, Palette)>>>,
}

impl CardWidgets {
    fn new(category: Category, callbacks: &Rc<RefCell<WindowCallbacks>>) -> Self {
        let root = GtkBox::new(Orientation::Vertical, 8);
        root.style_context().add_class("sysgauge-card");
        root.set_margin_start(4);
        root.set_margin_end(4);

        let title = Label::new(Some(category.title()));
        title.set_halign(Align::Start);
        title.style_context().add_class("sysgauge-title");
        if let Some(accessible) = title.accessible() {
            accessible.set_name(category.title());
            accessible.set_role(atk::Role::Heading);
        }
        root.pack_start(&title, false, false, 0);

        let gauge = DrawingArea::new();
        gauge.set_size_request(GAUGE_SIZE, GAUGE_SIZE);
        gauge.set_halign(Align::Center);
        root.pack_start(&gauge, false, false, 0);

        let caption = Label::new(None);
        caption.style_context().add_class("sysgauge-caption");
        root.pack_start(&caption, false, false, 0);

        let split_box = GtkBox::new(Orientation::Horizontal, 8);
        split_box.set_halign(Align::Center);
        let used_label = Label::new(None);
        let free_label = Label::new(None);
        root.pack_start(&split_box, false, false, 0);

        let state: Rc<RefCell<Option<(GaugeCard, Palette)>>> = Rc::new(RefCell::new(None));

        let draw_state = state.clone();
        gauge.connect_draw(move |area, cr| {
            if let Some((card, palette)) = draw_state.borrow().as_ref() {
                let width = area.allocated_width() as f64;
                let height = area.allocated_height() as f64;
                if let Err(e) = render_gauge(cr, card, palette, width, height) {
                    warn!("Failed to draw {} gauge: {}", card.category, e);
                }
            }
            glib::Propagation::Stop
        });

        if let Some(split) = Split::for_category(category) {
            for (mode, label) in [(ViewMode::Used, &used_label), (ViewMode::Free, &free_label)] {
                let button = Button::new();
                button.set_relief(ReliefStyle::None);
                button.add(label);
                let callbacks_ref = callbacks.clone();
                button.connect_clicked(move |_| {
                    (callbacks_ref.borrow().on_view_selected)(split, mode);
                });
                split_box.pack_start(&button, false, false, 0);
            }

            // Clicking the ring flips between used and free
            gauge.add_events(gdk::EventMask::BUTTON_PRESS_MASK);
            let click_state = state.clone();
            let callbacks_ref = callbacks.clone();
            gauge.connect_button_press_event(move |_, _| {
                let current = click_state
                    .borrow()
                    .as_ref()
                    .and_then(|(card, _)| current_mode(card));
                match current {
                    Some(mode) => {
                        (callbacks_ref.borrow().on_view_selected)(split, mode.toggled());
                        glib::Propagation::Stop
                    }
                    None => glib::Propagation::Proceed,
                }
            });
        }

        root.show_all();
        root.set_no_show_all(true);
        root.hide();

        Self {
            root,
            title,
            gauge,
            caption,
            split_box,
            used_label,
            free_label,
            state,
        }
    }

    fn show_card(&self, card: &GaugeCard, palette: &Palette) {
        self.title.set_text(card.title);

        match &card.caption {
            Caption::Label(text) => {
                self.caption.set_text(text);
                self.caption.set_visible(true);
                self.split_box.set_visible(false);
            }
            Caption::Split { used, free, .. } => {
                self.used_label.set_markup(&stat_markup(used));
                self.free_label.set_markup(&stat_markup(free));
                self.caption.set_visible(false);
                self.split_box.set_visible(true);
            }
        }

        if let Some(accessible) = self.gauge.accessible() {
            accessible.set_name(card.title);
            let description = format!("{:.0} percent, {}", card.percent, card.center_text);
            accessible.set_description(&description);
        }

        *self.state.borrow_mut() = Some((card.clone(), palette.clone()));
        self.gauge.queue_draw();
        self.root.set_visible(true);
    }

    fn hide(&self) {
        *self.state.borrow_mut() = None;
        self.root.set_visible(false);
    }
}

fn current_mode(card: &GaugeCard) -> Option<ViewMode> {
    match &card.caption {
        Caption::Split { used, .. } if used.active => Some(ViewMode::Used),
        Caption::Split { .. } => Some(ViewMode::Free),
        Caption::Label(_) => None,
    }
}

/// Placeholder line shown instead of gauges, if any
fn status_text(view: &DashboardView) -> Option<&'static str> {
    match view {
        DashboardView::Loading => Some("Loading..."),
        DashboardView::Ready { cards, .. } if cards.is_empty() => Some("No widgets enabled"),
        DashboardView::Ready { .. } => None,
    }
}

/// Pango markup for one side of a used/free selector
fn stat_markup(label: &StatLabel) -> String {
    format!(
        "<span foreground=\"{}\"{}>{}</span>",
        label.color.to_rgb_hex(),
        if label.active { " weight=\"bold\"" } else { "" },
        glib::markup_escape_text(&label.text)
    )
}

/// Window and card styling for a palette
fn palette_css(palette: &Palette) -> String {
    format!(
        "window.sysgauge {{ background-color: {background}; }}\n\
         .sysgauge-card {{ background-color: {card}; border-radius: 12px; padding: 12px; }}\n\
         .sysgauge-card label, .sysgauge-status {{ color: {text}; }}\n\
         .sysgauge-title {{ font-weight: bold; font-size: 14pt; }}\n",
        background = palette.background.to_css(),
        card = palette.card.to_css(),
        text = palette.text.to_css(),
    )
}

/// The dashboard window: one card per enabled category, or a status line
#[derive(Clone)]
pub struct DashboardWindow {
    window: Window,
    status_label: Label,
    cards: Rc<CategoryMap<CardWidgets>>,
    css: CssProvider,
    applied_palette: Rc<RefCell<Option<Palette>>>,
    callbacks: Rc<RefCell<WindowCallbacks>>,
}

impl DashboardWindow {
    /// With `hide_on_close` the close button only hides the window (the tray
    /// can bring it back); otherwise closing quits.
    pub fn new(hide_on_close: bool) -> Self {
        let window = Window::new(WindowType::Toplevel);
        window.set_title("System Dashboard");
        window.set_default_size(360, 560);
        window.set_position(WindowPosition::Center);
        window.style_context().add_class("sysgauge");

        if let Some(accessible) = window.accessible() {
            accessible.set_name("System Dashboard");
            accessible
                .set_description("Storage, battery, CPU and memory gauges. Press F5 to reload.");
        }

        let css = CssProvider::new();
        match gdk::Screen::default() {
            Some(screen) => gtk::StyleContext::add_provider_for_screen(
                &screen,
                &css,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            ),
            None => warn!("No default screen, dashboard styling disabled"),
        }

        let callbacks = Rc::new(RefCell::new(WindowCallbacks::default()));

        let main_box = GtkBox::new(Orientation::Vertical, 12);
        main_box.set_margin_top(12);
        main_box.set_margin_bottom(12);
        main_box.set_margin_start(12);
        main_box.set_margin_end(12);

        let status_label = Label::new(Some("Loading..."));
        status_label.style_context().add_class("sysgauge-status");
        status_label.set_valign(Align::Center);
        status_label.set_vexpand(true);
        if let Some(accessible) = status_label.accessible() {
            accessible.set_role(atk::Role::Statusbar);
        }
        // Visibility follows the view only; show_all must not bring it back
        status_label.show();
        status_label.set_no_show_all(true);
        main_box.pack_start(&status_label, true, true, 0);

        let cards = CategoryMap::from_fn(|category| CardWidgets::new(category, &callbacks));
        for (_, card) in cards.iter() {
            main_box.pack_start(&card.root, false, false, 0);
        }

        let scrolled = ScrolledWindow::new(None::<&gtk::Adjustment>, None::<&gtk::Adjustment>);
        scrolled.set_policy(gtk::PolicyType::Never, gtk::PolicyType::Automatic);
        scrolled.add(&main_box);
        window.add(&scrolled);

        let callbacks_ref = callbacks.clone();
        window.connect_key_press_event(move |_, event| {
            if event.keyval() == key::F5 {
                (callbacks_ref.borrow().on_reload)();
                return glib::Propagation::Stop;
            }
            glib::Propagation::Proceed
        });

        window.connect_delete_event(move |window, _| {
            if hide_on_close {
                window.hide();
            } else {
                gtk::main_quit();
            }
            glib::Propagation::Stop
        });

        Self {
            window,
            status_label,
            cards: Rc::new(cards),
            css,
            applied_palette: Rc::new(RefCell::new(None)),
            callbacks,
        }
    }

    pub fn set_callbacks(&self, callbacks: WindowCallbacks) {
        *self.callbacks.borrow_mut() = callbacks;
    }

    /// Render a view: the loading line, or the gauges it lists
    pub fn update(&self, view: &DashboardView) {
        self.set_status(status_text(view));
        match view {
            DashboardView::Loading => {
                for (_, card) in self.cards.iter() {
                    card.hide();
                }
            }
            DashboardView::Ready { palette, cards } => {
                self.apply_palette(palette);
                for (category, widgets) in self.cards.iter() {
                    match cards.iter().find(|card| card.category == category) {
                        Some(card) => widgets.show_card(card, palette),
                        None => widgets.hide(),
                    }
                }
            }
        }
    }

    fn set_status(&self, text: Option<&str>) {
        match text {
            Some(text) => {
                self.status_label.set_text(text);
                if let Some(accessible) = self.status_label.accessible() {
                    accessible.set_name(text);
                }
                self.status_label.set_visible(true);
            }
            None => self.status_label.set_visible(false),
        }
    }

    fn apply_palette(&self, palette: &Palette) {
        let mut applied = self.applied_palette.borrow_mut();
        if applied.as_ref() == Some(palette) {
            return;
        }
        if let Err(e) = self.css.load_from_data(palette_css(palette).as_bytes()) {
            warn!("Failed to apply dashboard colours: {}", e);
        }
        *applied = Some(palette.clone());
    }

    pub fn show(&self) {
        self.window.show_all();
        self.window.present();
    }

    pub fn hide(&self) {
        self.window.hide();
    }
}
