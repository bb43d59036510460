// Release builds run without a console window
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod domain;
#[cfg(windows)]
mod input;
mod logging;
mod platform;
mod ui;

#[cfg(windows)]
fn main() {
    if let Err(err) = run() {
        tracing::error!("fatal: {err:#}");
        eprintln!("tray-downloader error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn run() -> anyhow::Result<()> {
    use std::path::PathBuf;

    use anyhow::Context;

    use crate::app::controller::AppController;
    use crate::config::{AppConfig, AppPaths};
    use crate::platform::clipboard::SystemClipboard;
    use crate::platform::instance::{InstanceError, SingleInstance};
    use crate::platform::process::ShellLauncher;
    use crate::ui::IconRenderer;

    let paths = AppPaths::discover().context("locating the executable directory")?;
    let system_ready = paths.ensure_system_dir();

    if let Err(err) = logging::init_logging(&paths.log_file) {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {err:#}");
    }
    if let Err(err) = system_ready {
        tracing::warn!("could not create {}: {err}", paths.system_dir.display());
    }

    let _instance = match SingleInstance::acquire() {
        Ok(instance) => instance,
        Err(InstanceError::AlreadyRunning) => {
            tracing::info!("another instance is running, exiting");
            return Ok(());
        }
        Err(err) => return Err(err).context("acquiring the single-instance lock"),
    };

    let config = AppConfig::load_or_init(&paths.config_file).unwrap_or_else(|err| {
        tracing::warn!("using default settings: {err}");
        AppConfig::default()
    });

    let controller = AppController::new(paths, config, SystemClipboard::new(), ShellLauncher::new());
    if let Err(err) = controller.prepare() {
        tracing::warn!("startup preparation incomplete: {err}");
    }

    let fonts: Vec<PathBuf> = std::env::var_os("WINDIR")
        .map(PathBuf::from)
        .map(|windir| {
            vec![
                windir.join("Fonts").join("segoeuib.ttf"),
                windir.join("Fonts").join("segoeui.ttf"),
                windir.join("Fonts").join("arial.ttf"),
            ]
        })
        .unwrap_or_default();
    let renderer = IconRenderer::with_first_font(&fonts);

    tracing::info!(badge_font = renderer.has_font(), "starting tray");
    platform::window::run(controller, renderer).context("running the tray window")?;
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    logging::init_logging_stderr();
    tracing::error!("tray-downloader needs the Windows shell (tray icon and global hotkeys)");
    std::process::exit(1);
}
