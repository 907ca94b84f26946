mod gauge;
mod tray;
mod window;

pub use tray::{TrayCallbacks, TrayManager};
pub use window::{DashboardWindow, WindowCallbacks};
