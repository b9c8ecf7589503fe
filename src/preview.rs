//! Preview orchestration: metadata lookup, document generation, browser hand-off
//! and the error banner fallback.

use crate::config::PreviewConfig;
use crate::document::{self, DocumentOptions, EMPTY_IMAGE_URI};
use crate::error::{PreviewError, Result};
use crate::metadata::{CoordinateSource, Coordinates};
use crate::policy::{BrowserSettings, ResourcePolicy};
use crate::renderer::DocumentRenderer;
use crate::telemetry::{self, TelemetryEvent, TelemetrySink};
use crate::theme::{self, Color, ThemeSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Prefix of the banner shown when a preview fails
pub const ERROR_PREFIX: &str = "Failed to preview image: ";

/// What the shell asked to preview
#[derive(Debug, Clone)]
pub enum PreviewSource {
    File(PathBuf),
    /// Raw stream contents; this handler only supports file paths
    Stream(Vec<u8>),
}

impl PreviewSource {
    fn into_path(self) -> Result<PathBuf> {
        match self {
            PreviewSource::File(path) => Ok(path),
            PreviewSource::Stream(_) => Err(PreviewError::UnsupportedSource("stream")),
        }
    }
}

impl From<PathBuf> for PreviewSource {
    fn from(path: PathBuf) -> Self {
        PreviewSource::File(path)
    }
}

impl From<&Path> for PreviewSource {
    fn from(path: &Path) -> Self {
        PreviewSource::File(path.to_path_buf())
    }
}

impl From<&str> for PreviewSource {
    fn from(path: &str) -> Self {
        PreviewSource::File(PathBuf::from(path))
    }
}

/// Visible result of one preview request
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// The browser was navigated to this generated document
    Document(Url),
    /// A plain-text banner is shown instead
    Error(String),
}

/// Preview control bound to one renderer
pub struct PhotoGeoPreview<R: DocumentRenderer> {
    renderer: R,
    coordinates: Arc<dyn CoordinateSource>,
    telemetry: Box<dyn TelemetrySink>,
    config: PreviewConfig,
    work_dir: PathBuf,
    settings: BrowserSettings,
    background: Color,
}

impl<R: DocumentRenderer> PhotoGeoPreview<R> {
    /// Create the control; the theme is resolved once here
    pub fn new(
        mut renderer: R,
        coordinates: Arc<dyn CoordinateSource>,
        telemetry: Box<dyn TelemetrySink>,
        theme_source: &dyn ThemeSource,
        config: PreviewConfig,
        work_dir: PathBuf,
    ) -> Self {
        let background = theme::resolve_background_color(theme_source);
        renderer.set_background(background);

        Self {
            renderer,
            coordinates,
            telemetry,
            config,
            work_dir,
            settings: BrowserSettings::locked_down(),
            background,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Preview a file
    ///
    /// Never fails from the caller's point of view: errors end up as a
    /// banner in the renderer and as [`PreviewOutcome::Error`].
    pub async fn render_preview(&mut self, source: impl Into<PreviewSource>) -> PreviewOutcome {
        if self.config.is_disabled() {
            let message = PreviewError::DisabledByPolicy.to_string();
            tracing::info!(target: "preview", "Preview disabled by policy");
            self.renderer.clear();
            self.renderer.show_message(&message);
            return PreviewOutcome::Error(message);
        }

        cleanup_work_dir(&self.work_dir).await;

        match self.try_render(source.into()).await {
            Ok(document) => {
                tracing::info!(target: "preview", document = %document, "Preview ready");
                telemetry::emit_best_effort(self.telemetry.as_ref(), TelemetryEvent::FilePreviewed);
                PreviewOutcome::Document(document)
            }
            Err(e) => {
                tracing::error!(target: "preview", error = %e, "Preview failed");
                telemetry::emit_best_effort(
                    self.telemetry.as_ref(),
                    TelemetryEvent::FilePreviewError {
                        message: e.to_string(),
                    },
                );

                let message = format!("{}{}", ERROR_PREFIX, e);
                self.renderer.clear();
                self.renderer.show_message(&message);
                PreviewOutcome::Error(message)
            }
        }
    }

    async fn try_render(&mut self, source: PreviewSource) -> Result<Url> {
        let path = source.into_path()?;
        tracing::debug!(target: "preview", path = %path.display(), "Starting preview");

        let coordinates = self.lookup_coordinates(&path).await;
        let image_uri = load_image_uri(&path).await;

        let options = DocumentOptions {
            background: self.background,
            map_zoom: self.config.map_zoom,
        };
        let html = document::build_document(&image_uri, coordinates, &options);

        tokio::fs::create_dir_all(&self.work_dir).await?;
        self.renderer.initialize(&self.work_dir, &self.settings).await?;

        let document_path = self.work_dir.join(format!("{}.html", Uuid::new_v4()));
        let document = Url::from_file_path(&document_path)
            .map_err(|_| PreviewError::FileUrl(document_path.display().to_string()))?;

        self.renderer
            .set_resource_policy(ResourcePolicy::for_document(document.clone()))?;

        tokio::fs::write(&document_path, html).await?;
        self.renderer.navigate(&document).await?;

        Ok(document)
    }

    /// Soft-fails to `None` on any error
    async fn lookup_coordinates(&self, path: &Path) -> Option<Coordinates> {
        let source = Arc::clone(&self.coordinates);
        let path = path.to_path_buf();

        match tokio::task::spawn_blocking(move || source.extract_coordinates(&path)).await {
            Ok(coordinates) => {
                tracing::debug!(target: "preview", ?coordinates, "Coordinate lookup finished");
                coordinates
            }
            Err(e) => {
                tracing::warn!(target: "preview", error = %e, "Coordinate lookup failed");
                None
            }
        }
    }
}

async fn load_image_uri(path: &Path) -> String {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || document::image_data_uri(&path))
        .await
        .unwrap_or_else(|_| EMPTY_IMAGE_URI.to_string())
}

/// Remove documents left behind by earlier previews, ignoring all errors
pub fn cleanup_stale_documents(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        })
        .filter(|path| std::fs::remove_file(path).is_ok())
        .count()
}

async fn cleanup_work_dir(dir: &Path) {
    let dir = dir.to_path_buf();
    match tokio::task::spawn_blocking(move || cleanup_stale_documents(&dir)).await {
        Ok(removed) if removed > 0 => {
            tracing::debug!(target: "preview", removed, "Removed stale documents");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NO_GPS_MESSAGE;
    use crate::renderer::{HeadlessRenderer, View};
    use crate::theme::{DARK_BACKGROUND, LIGHT_BACKGROUND, ThemePreference};
    use std::io::Write;
    use std::sync::Mutex;

    struct StaticCoordinates(Option<Coordinates>);

    impl CoordinateSource for StaticCoordinates {
        fn extract_coordinates(&self, _path: &Path) -> Option<Coordinates> {
            self.0
        }
    }

    struct PanickingCoordinates;

    impl CoordinateSource for PanickingCoordinates {
        fn extract_coordinates(&self, _path: &Path) -> Option<Coordinates> {
            panic!("metadata reader crashed")
        }
    }

    #[derive(Clone, Default)]
    struct RecordingTelemetry(Arc<Mutex<Vec<TelemetryEvent>>>);

    impl RecordingTelemetry {
        fn events(&self) -> Vec<TelemetryEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl TelemetrySink for RecordingTelemetry {
        fn write_event(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingTelemetry;

    impl TelemetrySink for FailingTelemetry {
        fn write_event(&self, _event: &TelemetryEvent) -> anyhow::Result<()> {
            anyhow::bail!("no telemetry today")
        }
    }

    struct FixedTheme(ThemePreference);

    impl ThemeSource for FixedTheme {
        fn theme_preference(&self) -> ThemePreference {
            self.0
        }
    }

    /// Renderer whose browser never comes up
    #[derive(Default)]
    struct BrokenRenderer {
        cleared: bool,
        message: Option<String>,
    }

    impl DocumentRenderer for BrokenRenderer {
        fn set_background(&mut self, _color: Color) {}

        async fn initialize(&mut self, _dir: &Path, _settings: &BrowserSettings) -> Result<()> {
            Err(PreviewError::renderer("runtime not installed"))
        }

        fn set_resource_policy(&mut self, _policy: ResourcePolicy) -> Result<()> {
            Ok(())
        }

        async fn navigate(&mut self, _document: &Url) -> Result<()> {
            Ok(())
        }

        fn clear(&mut self) {
            self.cleared = true;
        }

        fn show_message(&mut self, message: &str) {
            self.message = Some(message.to_string());
        }
    }

    /// Renderer that leaves all folder handling to the caller
    #[derive(Default)]
    struct BareRenderer {
        navigated: Option<Url>,
    }

    impl DocumentRenderer for BareRenderer {
        fn set_background(&mut self, _color: Color) {}

        async fn initialize(&mut self, _dir: &Path, _settings: &BrowserSettings) -> Result<()> {
            Ok(())
        }

        fn set_resource_policy(&mut self, _policy: ResourcePolicy) -> Result<()> {
            Ok(())
        }

        async fn navigate(&mut self, document: &Url) -> Result<()> {
            self.navigated = Some(document.clone());
            Ok(())
        }

        fn clear(&mut self) {}

        fn show_message(&mut self, _message: &str) {}
    }

    struct Fixture {
        dir: tempfile::TempDir,
        telemetry: RecordingTelemetry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                telemetry: RecordingTelemetry::default(),
            }
        }

        fn work_dir(&self) -> PathBuf {
            self.dir.path().join("work")
        }

        fn photo(&self, name: &str, bytes: &[u8]) -> PathBuf {
            let path = self.dir.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(bytes).unwrap();
            path
        }

        fn preview<R: DocumentRenderer>(
            &self,
            renderer: R,
            coordinates: Option<Coordinates>,
            config: PreviewConfig,
        ) -> PhotoGeoPreview<R> {
            PhotoGeoPreview::new(
                renderer,
                Arc::new(StaticCoordinates(coordinates)),
                Box::new(self.telemetry.clone()),
                &FixedTheme(ThemePreference::Light),
                config,
                self.work_dir(),
            )
        }
    }

    fn document_text(outcome: &PreviewOutcome) -> String {
        match outcome {
            PreviewOutcome::Document(url) => std::fs::read_to_string(url.to_file_path().unwrap()).unwrap(),
            PreviewOutcome::Error(message) => panic!("unexpected error outcome: {}", message),
        }
    }

    #[tokio::test]
    async fn test_preview_without_coordinates() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.png", &[1, 2, 3]);
        let mut preview = fixture.preview(HeadlessRenderer::new(), None, PreviewConfig::default());

        let outcome = preview.render_preview(photo.as_path()).await;
        let html = document_text(&outcome);

        assert!(html.contains(NO_GPS_MESSAGE));
        assert!(html.contains("data:image/png;base64,AQID"));
        assert!(!html.contains("id='map'"));
        assert_eq!(fixture.telemetry.events(), vec![TelemetryEvent::FilePreviewed]);
        assert!(matches!(preview.renderer().view(), View::Document(_)));
    }

    #[tokio::test]
    async fn test_preview_with_coordinates_installs_policy() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.jpg", &[0xff, 0xd8]);
        let coordinates = Coordinates::new(48.8584, 2.2945);
        let mut preview = fixture.preview(HeadlessRenderer::new(), coordinates, PreviewConfig::default());

        let outcome = preview.render_preview(photo.as_path()).await;
        let html = document_text(&outcome);
        assert!(html.contains("setView([48.8584, 2.2945], 13)"));

        let PreviewOutcome::Document(document) = outcome else {
            unreachable!()
        };
        assert!(document.path().ends_with(".html"));

        let policy = preview.renderer().policy().unwrap();
        assert_eq!(policy.document(), &document);
        assert!(policy.evaluate(document.as_str()).is_allowed());
        assert!(!policy.evaluate("https://evil.example/x").is_allowed());
    }

    #[tokio::test]
    async fn test_unreadable_image_still_previews() {
        let fixture = Fixture::new();
        let missing = fixture.dir.path().join("missing.jpg");
        let mut preview = fixture.preview(HeadlessRenderer::new(), None, PreviewConfig::default());

        let outcome = preview.render_preview(missing.as_path()).await;
        let html = document_text(&outcome);

        assert!(html.contains(&format!("<img src='{}'", EMPTY_IMAGE_URI)));
        assert_eq!(fixture.telemetry.events(), vec![TelemetryEvent::FilePreviewed]);
    }

    #[tokio::test]
    async fn test_crashing_metadata_reader_falls_back_to_no_gps() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.jpg", &[0xff, 0xd8]);
        let mut preview = PhotoGeoPreview::new(
            HeadlessRenderer::new(),
            Arc::new(PanickingCoordinates),
            Box::new(fixture.telemetry.clone()),
            &FixedTheme(ThemePreference::Light),
            PreviewConfig::default(),
            fixture.work_dir(),
        );

        let outcome = preview.render_preview(photo.as_path()).await;
        let html = document_text(&outcome);

        assert!(html.contains(NO_GPS_MESSAGE));
        assert!(html.contains("data:image/jpeg;base64,/9g="));
        assert_eq!(fixture.telemetry.events(), vec![TelemetryEvent::FilePreviewed]);
    }

    #[tokio::test]
    async fn test_work_dir_created_before_document_is_written() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.png", &[1, 2, 3]);
        let mut preview = fixture.preview(BareRenderer::default(), None, PreviewConfig::default());
        assert!(!fixture.work_dir().exists());

        let outcome = preview.render_preview(photo.as_path()).await;

        let PreviewOutcome::Document(document) = &outcome else {
            panic!("expected document outcome, got {:?}", outcome);
        };
        assert!(document.to_file_path().unwrap().starts_with(fixture.work_dir()));
        assert_eq!(preview.renderer().navigated.as_ref(), Some(document));
        assert!(document_text(&outcome).contains(NO_GPS_MESSAGE));
    }

    #[tokio::test]
    async fn test_stream_source_shows_error_banner() {
        let fixture = Fixture::new();
        let mut preview = fixture.preview(HeadlessRenderer::new(), None, PreviewConfig::default());

        let outcome = preview.render_preview(PreviewSource::Stream(vec![1, 2])).await;

        let PreviewOutcome::Error(message) = outcome else {
            panic!("expected error outcome");
        };
        assert!(message.starts_with(ERROR_PREFIX));
        assert!(message.contains("must be a file path"));
        assert_eq!(preview.renderer().view(), &View::Message(message));
        assert!(matches!(
            fixture.telemetry.events().as_slice(),
            [TelemetryEvent::FilePreviewError { message }] if message.contains("stream")
        ));
    }

    #[tokio::test]
    async fn test_renderer_failure_shows_error_banner() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.gif", b"GIF89a");
        let mut preview = fixture.preview(BrokenRenderer::default(), None, PreviewConfig::default());

        let outcome = preview.render_preview(photo.as_path()).await;

        assert_eq!(
            outcome,
            PreviewOutcome::Error(format!("{}renderer error: runtime not installed", ERROR_PREFIX))
        );
        assert!(preview.renderer().cleared);
        assert!(preview.renderer().message.is_some());
        assert_eq!(
            fixture.telemetry.events(),
            vec![TelemetryEvent::FilePreviewError {
                message: "renderer error: runtime not installed".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_telemetry_does_not_affect_outcome() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.bmp", b"BM");
        let mut preview = PhotoGeoPreview::new(
            HeadlessRenderer::new(),
            Arc::new(StaticCoordinates(None)),
            Box::new(FailingTelemetry),
            &FixedTheme(ThemePreference::Unknown),
            PreviewConfig::default(),
            fixture.work_dir(),
        );

        let outcome = preview.render_preview(photo.as_path()).await;
        assert!(matches!(outcome, PreviewOutcome::Document(_)));
    }

    #[tokio::test]
    async fn test_disabled_by_policy() {
        let fixture = Fixture::new();
        let photo = fixture.photo("photo.jpg", b"x");
        let config = PreviewConfig {
            policy: crate::config::PolicyState::Disabled,
            ..PreviewConfig::default()
        };
        let mut preview = fixture.preview(HeadlessRenderer::new(), None, config);

        let outcome = preview.render_preview(photo.as_path()).await;

        assert_eq!(
            outcome,
            PreviewOutcome::Error("This preview handler is disabled by Group Policy.".to_string())
        );
        assert!(fixture.telemetry.events().is_empty());
        assert!(!fixture.work_dir().exists());
    }

    #[tokio::test]
    async fn test_stale_documents_are_removed() {
        let fixture = Fixture::new();
        let work_dir = fixture.work_dir();
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(work_dir.join("old.html"), "stale").unwrap();
        std::fs::write(work_dir.join("session.dat"), "keep").unwrap();

        let photo = fixture.photo("photo.webp", b"RIFF");
        let mut preview = fixture.preview(HeadlessRenderer::new(), None, PreviewConfig::default());
        let outcome = preview.render_preview(photo.as_path()).await;

        assert!(matches!(outcome, PreviewOutcome::Document(_)));
        assert!(!work_dir.join("old.html").exists());
        assert!(work_dir.join("session.dat").exists());
    }

    #[tokio::test]
    async fn test_new_request_supersedes_previous() {
        let fixture = Fixture::new();
        let first = fixture.photo("first.jpg", b"1");
        let second = fixture.photo("second.jpg", b"2");
        let mut preview = fixture.preview(HeadlessRenderer::new(), None, PreviewConfig::default());

        let first_outcome = preview.render_preview(first.as_path()).await;
        let second_outcome = preview.render_preview(second.as_path()).await;

        let (PreviewOutcome::Document(a), PreviewOutcome::Document(b)) = (&first_outcome, &second_outcome)
        else {
            panic!("expected two documents");
        };
        assert_ne!(a, b);
        assert!(!a.to_file_path().unwrap().exists());
        assert_eq!(preview.renderer().view(), &View::Document(b.clone()));
    }

    #[test]
    fn test_theme_resolved_at_construction() {
        let fixture = Fixture::new();
        let preview = PhotoGeoPreview::new(
            HeadlessRenderer::new(),
            Arc::new(StaticCoordinates(None)),
            Box::new(fixture.telemetry.clone()),
            &FixedTheme(ThemePreference::Dark),
            PreviewConfig::default(),
            fixture.work_dir(),
        );

        assert_eq!(preview.background(), DARK_BACKGROUND);
        assert_eq!(preview.renderer().background(), Some(DARK_BACKGROUND));
        assert_ne!(preview.background(), LIGHT_BACKGROUND);
    }
}
