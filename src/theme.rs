//! Background color selection from the OS light/dark preference.

use std::fmt;

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hex notation usable in CSS, e.g. `#1e1e1e`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Pack into a Win32 `COLORREF` layout (0x00BBGGRR)
    pub fn to_colorref(&self) -> u32 {
        (self.b as u32) << 16 | (self.g as u32) << 8 | self.r as u32
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub const DARK_BACKGROUND: Color = Color::rgb(30, 30, 30);
pub const LIGHT_BACKGROUND: Color = Color::rgb(255, 255, 255);

/// Light/dark preference as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemePreference {
    Light,
    Dark,
    Unknown,
}

impl ThemePreference {
    /// Interpret the `AppsUseLightTheme` personalization value
    ///
    /// Zero means dark, any other present value means light.
    pub fn from_apps_use_light_theme(value: Option<u32>) -> Self {
        match value {
            Some(0) => ThemePreference::Dark,
            Some(_) => ThemePreference::Light,
            None => ThemePreference::Unknown,
        }
    }
}

/// Source of the OS theme preference
pub trait ThemeSource {
    fn theme_preference(&self) -> ThemePreference;
}

/// Theme detection through the `dark-light` crate
pub struct SystemThemeSource;

impl ThemeSource for SystemThemeSource {
    fn theme_preference(&self) -> ThemePreference {
        match dark_light::detect() {
            Ok(dark_light::Mode::Dark) => ThemePreference::Dark,
            Ok(dark_light::Mode::Light) => ThemePreference::Light,
            Ok(dark_light::Mode::Unspecified) => ThemePreference::Unknown,
            Err(e) => {
                tracing::debug!(target: "theme", error = ?e, "Theme detection failed");
                ThemePreference::Unknown
            }
        }
    }
}

/// The theme source used by the preview host on this platform
pub fn default_theme_source() -> Box<dyn ThemeSource> {
    #[cfg(windows)]
    {
        Box::new(crate::host::registry::RegistryThemeSource)
    }
    #[cfg(not(windows))]
    {
        Box::new(SystemThemeSource)
    }
}

/// Pick the preview background for the current theme
///
/// Reads the source on every call. Anything but an explicit dark preference
/// yields the light background.
pub fn resolve_background_color(source: &dyn ThemeSource) -> Color {
    let preference = source.theme_preference();
    tracing::debug!(target: "theme", ?preference, "Resolved theme preference");

    match preference {
        ThemePreference::Dark => DARK_BACKGROUND,
        ThemePreference::Light | ThemePreference::Unknown => LIGHT_BACKGROUND,
    }
}
