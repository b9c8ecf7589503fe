use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Named auto-reset event the launcher signals whenever the pane rectangle changes
pub const RESIZE_EVENT_NAME: &str = r"Local\PhotoGeoPreviewResizeEvent";

/// Arguments passed by the shell-side preview handler
#[derive(Debug, Parser)]
#[command(name = "photogeo-preview", version, about = "Preview a photo with a map of where it was taken")]
pub struct HostArgs {
    /// Image file to preview
    pub file: PathBuf,

    /// Handle of the preview pane window, in hex
    pub parent: Option<String>,

    /// Left edge of the preview rectangle
    #[arg(allow_negative_numbers = true)]
    pub left: Option<i32>,

    /// Right edge of the preview rectangle
    #[arg(allow_negative_numbers = true)]
    pub right: Option<i32>,

    /// Top edge of the preview rectangle
    #[arg(allow_negative_numbers = true)]
    pub top: Option<i32>,

    /// Bottom edge of the preview rectangle
    #[arg(allow_negative_numbers = true)]
    pub bottom: Option<i32>,
}

/// Preview rectangle in parent client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl HostArgs {
    /// Parent window handle, if one was given
    pub fn parent_window(&self) -> Result<Option<usize>> {
        self.parent
            .as_deref()
            .map(parse_window_handle)
            .transpose()
    }

    /// The rectangle, only when all four edges are present
    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds {
            left: self.left?,
            right: self.right?,
            top: self.top?,
            bottom: self.bottom?,
        })
    }
}

fn parse_window_handle(value: &str) -> Result<usize> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    usize::from_str_radix(digits, 16)
        .with_context(|| format!("Invalid window handle: {}", value))
}
