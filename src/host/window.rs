use crate::cli::{Bounds, RESIZE_EVENT_NAME};
use std::cell::RefCell;
use std::ffi::c_void;
use webview2_com::Microsoft::Web::WebView2::Win32::ICoreWebView2Controller;
use windows::Win32::Foundation::{
    CloseHandle, HANDLE, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WAIT_OBJECT_0, WPARAM,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::{INFINITE, OpenEventW, SYNCHRONIZATION_SYNCHRONIZE};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{HSTRING, PCWSTR, Result, w};

const WINDOW_CLASS: PCWSTR = w!("PhotoGeoPreviewHost");

thread_local! {
    static CONTROLLER: RefCell<Option<ICoreWebView2Controller>> = const { RefCell::new(None) };
    static BANNER: RefCell<Option<HWND>> = const { RefCell::new(None) };
}

/// Attach (or detach) the controller that follows the window size
pub(crate) fn set_controller(controller: Option<ICoreWebView2Controller>) {
    CONTROLLER.with(|c| {
        if let Some(previous) = c.borrow_mut().take() {
            let _ = unsafe { previous.Close() };
        }
        *c.borrow_mut() = controller;
    });
}

/// Child window placed inside the preview pane
pub struct HostWindow {
    hwnd: HWND,
    parent: HWND,
}

/// Why the message loop woke up
#[derive(Debug, PartialEq, Eq)]
enum Wake {
    Resize,
    Input,
}

impl HostWindow {
    pub fn create(parent: usize, bounds: Option<Bounds>) -> Result<Self> {
        let parent = HWND(parent as *mut c_void);

        unsafe {
            let hinstance: HINSTANCE = GetModuleHandleW(PCWSTR::null())?.into();

            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(window_proc),
                hInstance: hinstance,
                hCursor: LoadCursorW(HINSTANCE::default(), IDC_ARROW)?,
                lpszClassName: WINDOW_CLASS,
                ..Default::default()
            };
            RegisterClassW(&wc);

            let rect = match bounds {
                Some(b) => RECT {
                    left: b.left,
                    top: b.top,
                    right: b.right,
                    bottom: b.bottom,
                },
                None => {
                    let mut rect = RECT::default();
                    GetClientRect(parent, &mut rect)?;
                    rect
                }
            };

            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS,
                w!("PhotoGeoPreview"),
                WS_CHILD | WS_VISIBLE | WS_CLIPCHILDREN,
                rect.left,
                rect.top,
                rect.right - rect.left,
                rect.bottom - rect.top,
                parent,
                HMENU::default(),
                hinstance,
                None,
            )?;

            Ok(Self { hwnd, parent })
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Resize to the parent pane's client area
    pub fn fit_to_parent(&self) {
        let mut rect = RECT::default();
        if unsafe { GetClientRect(self.parent, &mut rect) }.is_err() {
            return;
        }

        // WM_SIZE reflows the browser and the banner
        let result = unsafe {
            SetWindowPos(
                self.hwnd,
                HWND::default(),
                0,
                0,
                rect.right - rect.left,
                rect.bottom - rect.top,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
        match result {
            Ok(()) => tracing::debug!(
                target: "host::webview",
                width = rect.right - rect.left,
                height = rect.bottom - rect.top,
                "Fitted to preview pane"
            ),
            Err(e) => tracing::warn!(target: "host::webview", error = %e, "Failed to follow preview pane size"),
        }
    }

    /// Pump messages until the window is destroyed
    ///
    /// Between messages the loop also waits on the launcher's resize event
    /// and refits the window to the parent pane whenever it is signalled.
    pub fn run_message_loop(&self) {
        let resize_event = open_resize_event();
        let mut msg = MSG::default();

        'pump: loop {
            unsafe {
                while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                    if msg.message == WM_QUIT {
                        break 'pump;
                    }
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            if wait_for_wake(resize_event) == Wake::Resize {
                self.fit_to_parent();
            }
        }

        if let Some(event) = resize_event {
            let _ = unsafe { CloseHandle(event) };
        }
    }
}

fn open_resize_event() -> Option<HANDLE> {
    match unsafe {
        OpenEventW(
            SYNCHRONIZATION_SYNCHRONIZE,
            false,
            &HSTRING::from(RESIZE_EVENT_NAME),
        )
    } {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(target: "host::webview", error = %e, "No resize event, pane size is fixed");
            None
        }
    }
}

/// Block until the resize event is signalled or input is queued
fn wait_for_wake(resize_event: Option<HANDLE>) -> Wake {
    let handles: Vec<HANDLE> = resize_event.into_iter().collect();
    let result = unsafe { MsgWaitForMultipleObjects(Some(handles.as_slice()), false, INFINITE, QS_ALLINPUT) };

    if !handles.is_empty() && result == WAIT_OBJECT_0 {
        Wake::Resize
    } else {
        Wake::Input
    }
}

/// Replace the window contents with a read-only text banner
pub(crate) fn show_banner(hwnd: HWND, message: &str) {
    clear_banner();

    unsafe {
        let mut rect = RECT::default();
        let _ = GetClientRect(hwnd, &mut rect);
        let hinstance: HINSTANCE = GetModuleHandleW(PCWSTR::null())
            .map(Into::into)
            .unwrap_or_default();

        match CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            w!("STATIC"),
            &HSTRING::from(message),
            WS_CHILD | WS_VISIBLE,
            0,
            0,
            rect.right - rect.left,
            rect.bottom - rect.top,
            hwnd,
            HMENU::default(),
            hinstance,
            None,
        ) {
            Ok(banner) => BANNER.with(|b| *b.borrow_mut() = Some(banner)),
            Err(e) => {
                tracing::error!(target: "host::webview", error = %e, "Failed to create message banner")
            }
        }
    }
}

pub(crate) fn clear_banner() {
    BANNER.with(|b| {
        if let Some(banner) = b.borrow_mut().take() {
            let _ = unsafe { DestroyWindow(banner) };
        }
    });
}

fn fit_children(hwnd: HWND) {
    let mut rect = RECT::default();
    if unsafe { GetClientRect(hwnd, &mut rect) }.is_err() {
        return;
    }

    CONTROLLER.with(|c| {
        if let Some(controller) = c.borrow().as_ref() {
            let _ = unsafe { controller.SetBounds(rect) };
        }
    });
    BANNER.with(|b| {
        if let Some(banner) = *b.borrow() {
            let _ = unsafe {
                SetWindowPos(
                    banner,
                    HWND::default(),
                    0,
                    0,
                    rect.right - rect.left,
                    rect.bottom - rect.top,
                    SWP_NOZORDER | SWP_NOMOVE,
                )
            };
        }
    });
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_SIZE => {
            fit_children(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            set_controller(None);
            clear_banner();
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
