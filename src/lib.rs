pub mod acquisition;
pub mod analysis;
pub mod app;
pub mod clipboard;
mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod i18n;
pub mod logging;
pub mod notification;
pub mod preferences;
pub mod state;
pub mod storage;
pub mod ui;
pub use error::{AppError, AppResult};

/// Entrypoint used by higher-level integrations and CLI bindings.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!("starting Power Scouter");

    let mut app = app::App::new();
    app.start()?;

    tracing::info!("shutdown complete with state={}", app.state_label());
    Ok(())
}
