use anyhow::{Context, Result};
use clap::Parser;
use photogeo_preview::cli::{Bounds, HostArgs};
use photogeo_preview::config::PreviewConfig;
use photogeo_preview::logging::{self, LogConfig};
use photogeo_preview::metadata::default_coordinate_source;
use photogeo_preview::preview::{PhotoGeoPreview, PreviewOutcome};
use photogeo_preview::renderer::HeadlessRenderer;
use photogeo_preview::telemetry::TracingTelemetry;
use photogeo_preview::theme::default_theme_source;
use photogeo_preview::paths;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    let args = HostArgs::parse();

    let (config, config_error) = match PreviewConfig::load_from_path(&paths::settings_path()) {
        Ok(config) => (config, None),
        Err(e) => (PreviewConfig::default(), Some(e)),
    };

    // Keep the guard alive for the entire process lifetime
    let _log_guard = logging::init_logging(LogConfig::from_config(&config))
        .context("Failed to initialize logging system")?;

    if let Some(e) = config_error {
        tracing::warn!(target: "config", error = %e, "Settings unreadable, using defaults");
    }

    tracing::info!(target: "main", file = %args.file.display(), "Starting PhotoGeo preview host");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    let parent = args.parent_window()?;
    let bounds = args.bounds();

    match parent {
        Some(parent) => run_in_window(parent, bounds, args.file, config, runtime),
        None => run_headless(args.file, config, runtime),
    }
}

#[cfg(windows)]
fn run_in_window(
    parent: usize,
    bounds: Option<Bounds>,
    file: PathBuf,
    config: PreviewConfig,
    runtime: tokio::runtime::Runtime,
) -> Result<()> {
    photogeo_preview::host::run(parent, bounds, file, config, runtime)
}

#[cfg(not(windows))]
fn run_in_window(
    parent: usize,
    _bounds: Option<Bounds>,
    file: PathBuf,
    config: PreviewConfig,
    runtime: tokio::runtime::Runtime,
) -> Result<()> {
    tracing::warn!(target: "main", parent = %format!("{:#x}", parent), "Window hosting is only available on Windows");
    run_headless(file, config, runtime)
}

/// Generate the document and print its location
fn run_headless(file: PathBuf, config: PreviewConfig, runtime: tokio::runtime::Runtime) -> Result<()> {
    let theme_source = default_theme_source();
    let mut preview = PhotoGeoPreview::new(
        HeadlessRenderer::new(),
        Arc::from(default_coordinate_source()),
        Box::new(TracingTelemetry),
        theme_source.as_ref(),
        config,
        paths::work_dir(),
    );

    match runtime.block_on(preview.render_preview(file)) {
        PreviewOutcome::Document(url) => {
            tracing::info!(target: "main", document = %url, "Preview document written");
            println!("{}", url);
            Ok(())
        }
        PreviewOutcome::Error(message) => anyhow::bail!(message),
    }
}
