//! Windows preview host: a child window of the Explorer preview pane with
//! WebView2 rendering the generated document.

pub mod properties;
pub mod registry;
pub mod webview;
pub mod window;

use crate::cli::Bounds;
use crate::config::PreviewConfig;
use crate::metadata::default_coordinate_source;
use crate::preview::{PhotoGeoPreview, PreviewOutcome};
use crate::telemetry::TracingTelemetry;
use crate::theme::default_theme_source;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use webview::WebView2Renderer;
use window::HostWindow;
use windows::Win32::System::Com::{COINIT_APARTMENTTHREADED, CoInitializeEx, CoUninitialize};

/// Show the preview inside `parent` and pump messages until the window closes
pub fn run(
    parent: usize,
    bounds: Option<Bounds>,
    file: PathBuf,
    config: PreviewConfig,
    runtime: tokio::runtime::Runtime,
) -> Result<()> {
    unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
        .ok()
        .context("Failed to initialize COM")?;

    let result = run_inner(parent, bounds, file, config, runtime);

    unsafe { CoUninitialize() };
    result
}

fn run_inner(
    parent: usize,
    bounds: Option<Bounds>,
    file: PathBuf,
    config: PreviewConfig,
    runtime: tokio::runtime::Runtime,
) -> Result<()> {
    let window = HostWindow::create(parent, bounds).context("Failed to create host window")?;
    tracing::info!(target: "host::webview", parent = %format!("{:#x}", parent), "Host window created");

    let renderer = WebView2Renderer::new(window.hwnd());
    let theme_source = default_theme_source();
    let mut preview = PhotoGeoPreview::new(
        renderer,
        Arc::from(default_coordinate_source()),
        Box::new(TracingTelemetry),
        theme_source.as_ref(),
        config,
        crate::paths::work_dir(),
    );

    match runtime.block_on(preview.render_preview(file)) {
        PreviewOutcome::Document(url) => {
            tracing::info!(target: "host::webview", document = %url, "Document shown")
        }
        PreviewOutcome::Error(message) => {
            tracing::warn!(target: "host::webview", message = %message, "Error banner shown")
        }
    }

    window.run_message_loop();
    Ok(())
}
