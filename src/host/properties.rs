use crate::metadata::{CoordinateSource, Coordinates};
use std::path::Path;
use windows::Storage::StorageFile;
use windows::core::HSTRING;

/// Location from the Windows image property system
///
/// Uses the same decoded properties Explorer shows in the details pane, so
/// every format with a registered property handler is covered.
pub struct ImagePropertiesSource;

impl ImagePropertiesSource {
    fn read(path: &Path) -> windows::core::Result<Option<Coordinates>> {
        let file = StorageFile::GetFileFromPathAsync(&HSTRING::from(path.as_os_str()))?.get()?;
        let properties = file.Properties()?.GetImagePropertiesAsync()?.get()?;

        let latitude = properties.Latitude().ok().and_then(|v| v.Value().ok());
        let longitude = properties.Longitude().ok().and_then(|v| v.Value().ok());

        Ok(Coordinates::from_parts(latitude, longitude))
    }
}

impl CoordinateSource for ImagePropertiesSource {
    fn extract_coordinates(&self, path: &Path) -> Option<Coordinates> {
        match Self::read(path) {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::debug!(target: "metadata", path = %path.display(), error = %e, "Image properties unavailable");
                None
            }
        }
    }
}
