use crate::error::{PreviewError, Result};
use crate::host::window;
use crate::policy::{BrowserSettings, ResourceDecision, ResourcePolicy};
use crate::renderer::DocumentRenderer;
use crate::theme::Color;
use std::path::Path;
use std::sync::mpsc;
use url::Url;
use webview2_com::Microsoft::Web::WebView2::Win32::*;
use webview2_com::{
    CoreWebView2EnvironmentOptions, CreateCoreWebView2ControllerCompletedHandler,
    CreateCoreWebView2EnvironmentCompletedHandler, WebResourceRequestedEventHandler,
};
use windows::Win32::Foundation::{COLORREF, E_POINTER, HWND, RECT};
use windows::Win32::Graphics::Gdi::CreateSolidBrush;
use windows::Win32::UI::WindowsAndMessaging::{GCLP_HBRBACKGROUND, GetClientRect, SetClassLongPtrW};
use windows::core::{HSTRING, Interface, PCWSTR, PWSTR};

/// WebView2 hosted in the preview window
pub struct WebView2Renderer {
    hwnd: HWND,
    background: Option<Color>,
    environment: Option<ICoreWebView2Environment>,
    controller: Option<ICoreWebView2Controller>,
    webview: Option<ICoreWebView2>,
}

impl WebView2Renderer {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            hwnd,
            background: None,
            environment: None,
            controller: None,
            webview: None,
        }
    }

    fn webview(&self) -> Result<&ICoreWebView2> {
        self.webview
            .as_ref()
            .ok_or_else(|| PreviewError::renderer("WebView2 is not initialized"))
    }

    fn create_environment(
        user_data_dir: &Path,
        settings: &BrowserSettings,
    ) -> webview2_com::Result<ICoreWebView2Environment> {
        let data_dir = HSTRING::from(user_data_dir.as_os_str());
        let options = CoreWebView2EnvironmentOptions::default();
        unsafe { options.set_additional_browser_arguments(settings.additional_arguments.clone()) };
        let options: ICoreWebView2EnvironmentOptions = options.into();

        let (tx, rx) = mpsc::channel();
        CreateCoreWebView2EnvironmentCompletedHandler::wait_for_async_operation(
            Box::new(move |handler| unsafe {
                CreateCoreWebView2EnvironmentWithOptions(PCWSTR::null(), &data_dir, &options, &handler)
                    .map_err(webview2_com::Error::WindowsError)
            }),
            Box::new(move |error_code, environment| {
                error_code?;
                let _ = tx.send(environment.ok_or_else(|| windows::core::Error::from(E_POINTER)));
                Ok(())
            }),
        )?;

        rx.recv()
            .map_err(|_| webview2_com::Error::SendError)?
            .map_err(webview2_com::Error::WindowsError)
    }

    fn create_controller(
        hwnd: HWND,
        environment: &ICoreWebView2Environment,
    ) -> webview2_com::Result<ICoreWebView2Controller> {
        let environment = environment.clone();
        let (tx, rx) = mpsc::channel();
        CreateCoreWebView2ControllerCompletedHandler::wait_for_async_operation(
            Box::new(move |handler| unsafe {
                environment
                    .CreateCoreWebView2Controller(hwnd, &handler)
                    .map_err(webview2_com::Error::WindowsError)
            }),
            Box::new(move |error_code, controller| {
                error_code?;
                let _ = tx.send(controller.ok_or_else(|| windows::core::Error::from(E_POINTER)));
                Ok(())
            }),
        )?;

        rx.recv()
            .map_err(|_| webview2_com::Error::SendError)?
            .map_err(webview2_com::Error::WindowsError)
    }

    fn apply_settings(webview: &ICoreWebView2, settings: &BrowserSettings) -> windows::core::Result<()> {
        unsafe {
            let core = webview.Settings()?;
            core.SetAreDefaultScriptDialogsEnabled(settings.script_dialogs)?;
            core.SetAreDefaultContextMenusEnabled(settings.context_menus)?;
            core.SetAreDevToolsEnabled(settings.dev_tools)?;
            core.SetAreHostObjectsAllowed(settings.host_objects)?;
            core.SetIsScriptEnabled(settings.scripts)?;
            core.SetIsWebMessageEnabled(settings.web_messages)?;

            let autofill = core.cast::<ICoreWebView2Settings4>()?;
            autofill.SetIsGeneralAutofillEnabled(settings.general_autofill)?;
            autofill.SetIsPasswordAutosaveEnabled(settings.password_autosave)?;
        }
        Ok(())
    }

    fn apply_background(&self) {
        let Some(color) = self.background else {
            return;
        };

        unsafe {
            let brush = CreateSolidBrush(COLORREF(color.to_colorref()));
            SetClassLongPtrW(self.hwnd, GCLP_HBRBACKGROUND, brush.0 as isize);
        }

        if let Some(controller) = &self.controller {
            if let Ok(controller2) = controller.cast::<ICoreWebView2Controller2>() {
                let background = COREWEBVIEW2_COLOR {
                    A: 255,
                    R: color.r,
                    G: color.g,
                    B: color.b,
                };
                let _ = unsafe { controller2.SetDefaultBackgroundColor(background) };
            }
        }
    }
}

impl DocumentRenderer for WebView2Renderer {
    fn set_background(&mut self, color: Color) {
        self.background = Some(color);
        self.apply_background();
    }

    async fn initialize(&mut self, user_data_dir: &Path, settings: &BrowserSettings) -> Result<()> {
        tokio::fs::create_dir_all(user_data_dir).await?;
        window::clear_banner();

        let environment = Self::create_environment(user_data_dir, settings)
            .map_err(|e| PreviewError::renderer(format!("{:?}", e)))?;
        let controller = Self::create_controller(self.hwnd, &environment)
            .map_err(|e| PreviewError::renderer(format!("{:?}", e)))?;

        let webview = unsafe {
            let mut rect = RECT::default();
            GetClientRect(self.hwnd, &mut rect).map_err(PreviewError::renderer)?;
            controller.SetBounds(rect).map_err(PreviewError::renderer)?;
            controller.SetIsVisible(true).map_err(PreviewError::renderer)?;
            controller.CoreWebView2().map_err(PreviewError::renderer)?
        };
        Self::apply_settings(&webview, settings).map_err(PreviewError::renderer)?;

        tracing::debug!(target: "host::webview", data_dir = %user_data_dir.display(), "WebView2 initialized");

        window::set_controller(Some(controller.clone()));
        self.environment = Some(environment);
        self.controller = Some(controller);
        self.webview = Some(webview);
        self.apply_background();
        Ok(())
    }

    fn set_resource_policy(&mut self, policy: ResourcePolicy) -> Result<()> {
        let webview = self.webview()?.clone();
        let environment = self
            .environment
            .clone()
            .ok_or_else(|| PreviewError::renderer("WebView2 environment missing"))?;

        let handler = WebResourceRequestedEventHandler::create(Box::new(move |_sender, args| {
            let Some(args) = args else {
                return Ok(());
            };

            let uri = unsafe {
                let request = args.Request()?;
                let mut uri = PWSTR::null();
                request.Uri(&mut uri)?;
                webview2_com::take_pwstr(uri)
            };

            if let ResourceDecision::Block { status, reason } = policy.evaluate(&uri) {
                tracing::debug!(target: "preview::policy", uri = %uri, status, "Request blocked");
                unsafe {
                    let response = environment.CreateWebResourceResponse(
                        None,
                        status as i32,
                        &HSTRING::from(reason),
                        &HSTRING::new(),
                    )?;
                    args.SetResponse(&response)?;
                }
            }
            Ok(())
        }));

        unsafe {
            webview
                .AddWebResourceRequestedFilter(&HSTRING::from("*"), COREWEBVIEW2_WEB_RESOURCE_CONTEXT_ALL)
                .map_err(PreviewError::renderer)?;
            let mut token = Default::default();
            webview
                .add_WebResourceRequested(&handler, &mut token)
                .map_err(PreviewError::renderer)?;
        }
        Ok(())
    }

    async fn navigate(&mut self, document: &Url) -> Result<()> {
        let webview = self.webview()?;
        unsafe { webview.Navigate(&HSTRING::from(document.as_str())) }.map_err(PreviewError::renderer)
    }

    fn clear(&mut self) {
        window::set_controller(None);
        window::clear_banner();
        self.webview = None;
        self.controller = None;
        self.environment = None;
    }

    fn show_message(&mut self, message: &str) {
        window::show_banner(self.hwnd, message);
    }
}
