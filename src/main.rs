mod app;
mod config;
mod dashboard;
mod monitor;
mod ui;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use app::App;
use config::Settings;
use dashboard::{Category, EnabledSet, ThemeVariant};

/// sysgauge - storage, battery, CPU and RAM as circular gauges
#[derive(Parser, Debug)]
#[command(name = "sysgauge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (default: ~/.config/sysgauge/settings.ini)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Colour theme, overriding the settings file (light or dark)
    #[arg(short = 't', long = "theme", value_name = "THEME")]
    theme: Option<ThemeVariant>,

    /// Gauges to show, overriding the settings file (e.g. --enable storage,battery)
    #[arg(short = 'e', long = "enable", value_name = "CATEGORIES", value_delimiter = ',')]
    enable: Option<Vec<Category>>,

    /// Poll without a window and log every update
    #[arg(long = "headless")]
    headless: bool,

    /// Do not create a tray icon; closing the window quits
    #[arg(long = "no-tray")]
    no_tray: bool,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match cli.config.clone().or_else(Settings::default_path) {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => {
            warn!("No config directory found, using default settings");
            Settings::default()
        }
    };

    let dashboard = &mut settings.dashboard;
    if let Some(theme) = cli.theme {
        dashboard.appearance.theme = theme;
    }
    if let Some(categories) = &cli.enable {
        dashboard.enabled = EnabledSet::from_fn(|c| categories.contains(&c));
    }

    Ok(settings)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(&cli)?;

    let enabled: Vec<String> = settings
        .dashboard
        .enabled
        .enabled()
        .map(|c| c.to_string())
        .collect();
    if enabled.is_empty() {
        warn!("No gauges enabled; use --enable or the [widgets] section to pick some");
    } else {
        info!("Enabled gauges: {}", enabled.join(", "));
    }

    if cli.headless {
        let main_loop = glib::MainLoop::new(None, false);
        let main_loop_ref = main_loop.clone();
        ctrlc::set_handler(move || main_loop_ref.quit())
            .context("Failed to install Ctrl+C handler")?;

        let app = Rc::new(RefCell::new(App::new(settings)));
        App::start_headless(app.clone());
        main_loop.run();
        app.borrow_mut().shutdown();
        return Ok(());
    }

    gtk::init().context("Failed to initialize GTK")?;

    // Set application name for accessibility
    glib::set_application_name("System Dashboard");
    glib::set_prgname(Some("sysgauge"));

    ctrlc::set_handler(|| glib::MainContext::default().invoke(gtk::main_quit))
        .context("Failed to install Ctrl+C handler")?;

    let app = Rc::new(RefCell::new(App::new(settings)));
    App::start(app.clone(), !cli.no_tray);

    // Run GTK main loop
    gtk::main();

    // Cleanup
    app.borrow_mut().shutdown();
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Allow RUST_LOG to override the -d level
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting sysgauge v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
