//! HTML generation for the preview: inline image plus an optional Leaflet map.

use crate::metadata::Coordinates;
use crate::theme::{Color, LIGHT_BACKGROUND};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::path::Path;

/// Placeholder used when the image bytes cannot be read
pub const EMPTY_IMAGE_URI: &str = "data:image/png;base64,";

/// Banner shown when the image carries no location
pub const NO_GPS_MESSAGE: &str = "No GPS data found in this image.";

pub const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
pub const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
pub const TILE_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Bounds for the image pane share, in percent of the container height
pub const SPLIT_MIN_PERCENT: u8 = 10;
pub const SPLIT_MAX_PERCENT: u8 = 90;

const DEFAULT_MIME: &str = "image/jpeg";

/// Script expression that bounds the dragged split percentage held in `value`
pub fn split_clamp_expression(value: &str) -> String {
    format!(
        "Math.min({}, Math.max({}, {}))",
        SPLIT_MAX_PERCENT, SPLIT_MIN_PERCENT, value
    )
}

/// MIME type for an image path, by extension (case-insensitive)
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => DEFAULT_MIME,
    }
}

/// Encode raw image bytes as a data URI
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Read an image file into a data URI
///
/// Never fails: an unreadable file yields [`EMPTY_IMAGE_URI`].
pub fn image_data_uri(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => encode_data_uri(mime_type_for(path), &bytes),
        Err(e) => {
            tracing::warn!(target: "preview::document", path = %path.display(), error = %e, "Failed to read image, using placeholder");
            EMPTY_IMAGE_URI.to_string()
        }
    }
}

/// Presentation options for the generated document
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub background: Color,
    pub map_zoom: u8,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            background: LIGHT_BACKGROUND,
            map_zoom: 13,
        }
    }
}

/// Build the preview document
///
/// With coordinates the page is split into an image pane, a draggable splitter
/// and a map pane. Without coordinates it shows the image with a banner.
pub fn build_document(
    image_uri: &str,
    coordinates: Option<Coordinates>,
    options: &DocumentOptions,
) -> String {
    match coordinates {
        Some(coordinates) => map_document(image_uri, coordinates, options),
        None => image_only_document(image_uri, options),
    }
}

fn map_document(image_uri: &str, coordinates: Coordinates, options: &DocumentOptions) -> String {
    // f64 Display never uses a locale decimal separator or exponent notation
    let lat = coordinates.latitude();
    let lon = coordinates.longitude();
    let zoom = options.map_zoom;
    let background = options.background;
    let clamp = split_clamp_expression("raw");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset='utf-8'>
    <meta name='viewport' content='width=device-width, initial-scale=1.0'>
    <link rel='stylesheet' href='{LEAFLET_CSS}' />
    <style>
        body {{
            margin: 0;
            padding: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            height: 100vh;
            overflow: hidden;
            background: {background};
        }}
        .container {{
            display: flex;
            flex-direction: column;
            height: 100vh;
        }}
        .image-pane {{
            flex: 1;
            display: flex;
            justify-content: center;
            align-items: center;
            overflow: hidden;
        }}
        .image-pane img {{
            max-width: 100%;
            max-height: 100%;
            object-fit: contain;
        }}
        .splitter {{
            height: 5px;
            background: #ccc;
            cursor: ns-resize;
            user-select: none;
        }}
        .splitter:hover {{
            background: #999;
        }}
        .map-pane {{
            flex: 1;
            position: relative;
        }}
        #map {{
            width: 100%;
            height: 100%;
        }}
    </style>
</head>
<body>
    <div class='container' id='container'>
        <div class='image-pane' id='imagePane'>
            <img src='{image_uri}' alt='Photo' />
        </div>
        <div class='splitter' id='splitter'></div>
        <div class='map-pane' id='mapPane'>
            <div id='map'></div>
        </div>
    </div>
    <script src='{LEAFLET_JS}'></script>
    <script>
        var map = L.map('map').setView([{lat}, {lon}], {zoom});

        L.tileLayer('{TILE_URL_TEMPLATE}', {{
            attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
        }}).addTo(map);

        L.marker([{lat}, {lon}]).addTo(map)
            .bindPopup('Photo location')
            .openPopup();

        const splitter = document.getElementById('splitter');
        const container = document.getElementById('container');
        const imagePane = document.getElementById('imagePane');
        const mapPane = document.getElementById('mapPane');
        let isDragging = false;

        splitter.addEventListener('mousedown', (e) => {{
            isDragging = true;
            e.preventDefault();
        }});

        document.addEventListener('mouseup', () => {{
            if (isDragging) {{
                isDragging = false;
                map.invalidateSize();
            }}
        }});

        document.addEventListener('mousemove', (e) => {{
            if (!isDragging) {{
                return;
            }}
            const rect = container.getBoundingClientRect();
            const raw = ((e.clientY - rect.top) / rect.height) * 100;
            const percentage = {clamp};
            imagePane.style.flex = percentage;
            mapPane.style.flex = 100 - percentage;
        }});
    </script>
</body>
</html>"#
    )
}

fn image_only_document(image_uri: &str, options: &DocumentOptions) -> String {
    let background = options.background;

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset='utf-8'>
    <meta name='viewport' content='width=device-width, initial-scale=1.0'>
    <style>
        body {{
            margin: 0;
            padding: 0;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            background: {background};
        }}
        img {{
            max-width: 100%;
            max-height: 100%;
            object-fit: contain;
        }}
        .no-gps {{
            position: fixed;
            top: 10px;
            left: 10px;
            background: #fff;
            color: #000;
            padding: 10px;
            border-radius: 5px;
            box-shadow: 0 2px 5px rgba(0,0,0,0.2);
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            font-size: 14px;
        }}
    </style>
</head>
<body>
    <div class='no-gps'>{NO_GPS_MESSAGE}</div>
    <img src='{image_uri}' alt='Photo' />
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::DARK_BACKGROUND;
    use std::io::Write;

    #[test]
    fn test_mime_table() {
        let cases = [
            ("a.jpg", "image/jpeg"),
            ("a.JPEG", "image/jpeg"),
            ("a.Png", "image/png"),
            ("a.gif", "image/gif"),
            ("a.BMP", "image/bmp"),
            ("a.webp", "image/webp"),
            ("a.heic", "image/jpeg"),
            ("noextension", "image/jpeg"),
        ];
        for (name, mime) in cases {
            assert_eq!(mime_type_for(Path::new(name)), mime, "{}", name);
        }
    }

    #[test]
    fn test_data_uri_from_file() {
        let mut file = tempfile::Builder::new().suffix(".PNG").tempfile().unwrap();
        file.write_all(&[1, 2, 3]).unwrap();

        assert_eq!(image_data_uri(file.path()), "data:image/png;base64,AQID");
    }

    #[test]
    fn test_unreadable_image_uses_placeholder() {
        let uri = image_data_uri(Path::new("/nonexistent/photo.webp"));
        assert_eq!(uri, EMPTY_IMAGE_URI);
    }

    #[test]
    fn test_document_without_coordinates() {
        let html = build_document("data:image/png;base64,AQID", None, &DocumentOptions::default());

        assert!(html.contains(NO_GPS_MESSAGE));
        assert!(html.contains("<img src='data:image/png;base64,AQID'"));
        assert!(!html.contains("id='map'"));
        assert!(!html.contains("leaflet"));
        assert!(!html.contains("openstreetmap"));
    }

    #[test]
    fn test_document_with_coordinates() {
        let coordinates = Coordinates::new(47.6062, -122.3321).unwrap();
        let html = build_document(EMPTY_IMAGE_URI, Some(coordinates), &DocumentOptions::default());

        assert!(html.contains("<div id='map'></div>"));
        assert!(html.contains("setView([47.6062, -122.3321], 13)"));
        assert!(html.contains("L.marker([47.6062, -122.3321])"));
        assert!(html.contains(LEAFLET_JS));
        assert!(!html.contains(NO_GPS_MESSAGE));
    }

    #[test]
    fn test_small_coordinates_render_as_plain_decimals() {
        let coordinates = Coordinates::new(0.000001, -0.5).unwrap();
        let html = build_document(EMPTY_IMAGE_URI, Some(coordinates), &DocumentOptions::default());

        assert!(html.contains("setView([0.000001, -0.5]"));
        assert!(!html.contains("0,5"));
    }

    #[test]
    fn test_split_clamp_expression_bounds() {
        // The drag handler runs in the browser, so the bound is checked on the emitted script
        assert_eq!(split_clamp_expression("raw"), "Math.min(90, Math.max(10, raw))");
        assert_eq!(split_clamp_expression("x"), "Math.min(90, Math.max(10, x))");
    }

    #[test]
    fn test_splitter_is_clamped() {
        let coordinates = Coordinates::new(1.0, 2.0).unwrap();
        let html = build_document(EMPTY_IMAGE_URI, Some(coordinates), &DocumentOptions::default());

        assert!(html.contains(&format!("const percentage = {};", split_clamp_expression("raw"))));
        assert!(html.contains("splitter.addEventListener('mousedown'"));
        assert!(html.contains("document.addEventListener('mouseup'"));
    }

    #[test]
    fn test_document_uses_theme_background_and_zoom() {
        let options = DocumentOptions {
            background: DARK_BACKGROUND,
            map_zoom: 7,
        };
        let coordinates = Coordinates::new(1.0, 2.0).unwrap();
        let html = build_document(EMPTY_IMAGE_URI, Some(coordinates), &options);

        assert!(html.contains("background: #1e1e1e;"));
        assert!(html.contains("setView([1, 2], 7)"));
    }
}
