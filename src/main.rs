//! Desktop entry point for the YouTube downloader

// eframe window and widgets
mod gui;
// Thumbnail decoding for the preview pane
mod thumbnail;

use anyhow::{Context, Result};
use eframe::egui::{self, Visuals};
use rfd::{MessageButtons, MessageDialog, MessageLevel};

use tubeconvert::AppContext;
use tubeconvert::config::Config;

const STARTUP_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Program entry point: any failure before or inside the event loop is
/// logged and reported in a blocking message box
fn main() -> Result<()> {
    let result = run();
    if let Err(e) = &result {
        tracing::error!(error = ?e, "application failed");
        MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title("Error")
            .set_description(&error_message(e))
            .set_buttons(MessageButtons::Ok)
            .show();
    }
    result
}

/// Loads config, starts logging and the application context, then hands
/// control to the GUI event loop
fn run() -> Result<()> {
    let config = Config::from_env()?;
    tubeconvert::logging::init(&config.log_file)?;
    let ctx = AppContext::start(&config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_min_inner_size([800.0, 400.0]),
        ..Default::default()
    };
    eframe::run_native(
        "YouTube Downloader",
        options,
        Box::new(move |cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(gui::TubeApp::new(&cc.egui_ctx, ctx))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("GUI event loop failed")
}

fn error_message(err: &anyhow::Error) -> String {
    format!("{STARTUP_ERROR}\n\n{err:#}")
}
