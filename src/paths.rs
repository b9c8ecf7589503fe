use std::path::PathBuf;

const FEATURE_DIR: &str = "PhotoGeoPreview";
const WORK_DIR: &str = "PhotoGeoPreview-Temp";

/// Root for per-user low-integrity data
///
/// On Windows this is `%USERPROFILE%\AppData\LocalLow`, elsewhere the user cache directory.
fn local_low_dir() -> PathBuf {
    let base = if cfg!(windows) {
        dirs::home_dir().map(|home| home.join("AppData").join("LocalLow"))
    } else {
        dirs::cache_dir()
    };
    absolute_or_temp(base)
}

/// Generated documents are addressed by `file://` URL, which needs an absolute path
fn absolute_or_temp(base: Option<PathBuf>) -> PathBuf {
    base.filter(|path| path.is_absolute())
        .unwrap_or_else(std::env::temp_dir)
}

/// Folder holding browser session data and generated documents
pub fn work_dir() -> PathBuf {
    local_low_dir().join(WORK_DIR)
}

/// Folder holding the settings file and logs
pub fn feature_dir() -> PathBuf {
    local_low_dir().join(FEATURE_DIR)
}

pub fn log_dir() -> PathBuf {
    feature_dir().join("logs")
}

pub fn settings_path() -> PathBuf {
    feature_dir().join("settings.json")
}
