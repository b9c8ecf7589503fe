pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod paths;
pub mod policy;
pub mod preview;
pub mod renderer;
pub mod telemetry;
pub mod theme;

#[cfg(windows)]
pub mod host;

// Re-export commonly used types
pub use config::PreviewConfig;
pub use error::{PreviewError, Result};
pub use logging::{ConsoleOutput, LogConfig, LogGuard};
pub use metadata::{CoordinateSource, Coordinates};
pub use preview::{PhotoGeoPreview, PreviewOutcome, PreviewSource};
pub use renderer::{DocumentRenderer, HeadlessRenderer};
pub use telemetry::{TelemetryEvent, TelemetrySink};
pub use theme::{Color, ThemeSource};
