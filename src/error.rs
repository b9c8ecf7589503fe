use thiserror::Error;

/// Errors that abort a preview and end up in the error banner
#[derive(Error, Debug)]
pub enum PreviewError {
    /// The host handed over something other than a file path
    #[error("preview source for PhotoGeoPreview must be a file path but was a {0}")]
    UnsupportedSource(&'static str),

    /// The handler is switched off by policy
    #[error("This preview handler is disabled by Group Policy.")]
    DisabledByPolicy,

    /// Reading or writing the generated document failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded browser could not be initialized or navigated
    #[error("renderer error: {0}")]
    Renderer(String),

    /// A local path could not be expressed as a file URL
    #[error("cannot build a file URL for {0}")]
    FileUrl(String),
}

impl PreviewError {
    /// Create a renderer error from anything printable
    pub fn renderer(message: impl std::fmt::Display) -> Self {
        PreviewError::Renderer(message.to_string())
    }
}

/// Result type alias for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;
