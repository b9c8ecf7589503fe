use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A validated decimal latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Build a pair, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Combine optional components; both must be present
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            _ => None,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Capability that extracts the capture location of an image
///
/// Implementations never fail: anything that prevents reading a location
/// is reported as `None`.
pub trait CoordinateSource: Send + Sync {
    fn extract_coordinates(&self, path: &Path) -> Option<Coordinates>;
}

/// Reads GPS tags from the file's EXIF block
pub struct ExifCoordinateSource;

impl CoordinateSource for ExifCoordinateSource {
    fn extract_coordinates(&self, path: &Path) -> Option<Coordinates> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(target: "metadata", path = %path.display(), error = %e, "Cannot open image");
                return None;
            }
        };

        let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
            Ok(exif) => exif,
            Err(e) => {
                tracing::debug!(target: "metadata", path = %path.display(), error = %e, "No EXIF data");
                return None;
            }
        };

        let latitude = gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
        let longitude = gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);

        Coordinates::from_parts(latitude, longitude)
    }
}

/// Convert a degrees/minutes/seconds GPS field into signed decimal degrees
fn gps_coordinate(exif: &exif::Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let coord = exif.get_field(coord_tag, In::PRIMARY)?;

    let Value::Rational(ref parts) = coord.value else {
        return None;
    };
    if parts.len() != 3 {
        return None;
    }
    let decimal = dms_to_decimal(parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64());

    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|field| match field.value {
            Value::Ascii(ref values) => values.first().and_then(|v| v.first().copied()),
            _ => None,
        });

    Some(apply_reference(decimal, reference))
}

fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// South and west references flip the sign
fn apply_reference(decimal: f64, reference: Option<u8>) -> f64 {
    match reference {
        Some(b'S') | Some(b'W') | Some(b's') | Some(b'w') => -decimal,
        _ => decimal,
    }
}

/// The coordinate source used by the preview host on this platform
pub fn default_coordinate_source() -> Box<dyn CoordinateSource> {
    #[cfg(windows)]
    {
        Box::new(crate::host::properties::ImagePropertiesSource)
    }
    #[cfg(not(windows))]
    {
        Box::new(ExifCoordinateSource)
    }
}
