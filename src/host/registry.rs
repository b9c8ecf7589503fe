use crate::theme::{ThemePreference, ThemeSource};
use std::ffi::c_void;
use windows::Win32::System::Registry::{HKEY_CURRENT_USER, RRF_RT_REG_DWORD, RegGetValueW};
use windows::core::w;

/// Reads `AppsUseLightTheme` from the user's personalization key
pub struct RegistryThemeSource;

impl RegistryThemeSource {
    fn apps_use_light_theme() -> Option<u32> {
        let mut data: u32 = 0;
        let mut size = std::mem::size_of::<u32>() as u32;

        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                w!("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize"),
                w!("AppsUseLightTheme"),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut data as *mut u32 as *mut c_void),
                Some(&mut size),
            )
        };

        if status.is_ok() {
            Some(data)
        } else {
            tracing::debug!(target: "theme", status = status.0, "AppsUseLightTheme not readable");
            None
        }
    }
}

impl ThemeSource for RegistryThemeSource {
    fn theme_preference(&self) -> ThemePreference {
        ThemePreference::from_apps_use_light_theme(Self::apps_use_light_theme())
    }
}
