use crate::error::Result;
use crate::policy::{BrowserSettings, ResourcePolicy};
use crate::theme::Color;
use std::path::Path;
use url::Url;

/// Surface that displays the generated document or an error banner
///
/// The preview orchestrator only talks to the browser through this trait.
/// Calls arrive in order: `set_background`, `initialize`,
/// `set_resource_policy`, `navigate`. On failure `clear` then
/// `show_message` replace whatever was built so far.
#[allow(async_fn_in_trait)]
pub trait DocumentRenderer {
    fn set_background(&mut self, color: Color);

    /// Create the browser session with its data kept under `user_data_dir`
    async fn initialize(&mut self, user_data_dir: &Path, settings: &BrowserSettings) -> Result<()>;

    /// Install the filter every outgoing request goes through
    fn set_resource_policy(&mut self, policy: ResourcePolicy) -> Result<()>;

    async fn navigate(&mut self, document: &Url) -> Result<()>;

    /// Drop any partially built view
    fn clear(&mut self);

    /// Show a plain-text message instead of the document
    fn show_message(&mut self, message: &str);
}

/// What a renderer currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Empty,
    Document(Url),
    Message(String),
}

/// Renderer without a window
///
/// Used when the host process has no parent window to attach to: the
/// document is left on disk and the caller reports its location.
pub struct HeadlessRenderer {
    view: View,
    background: Option<Color>,
    policy: Option<ResourcePolicy>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self {
            view: View::Empty,
            background: None,
            policy: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    pub fn policy(&self) -> Option<&ResourcePolicy> {
        self.policy.as_ref()
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRenderer for HeadlessRenderer {
    fn set_background(&mut self, color: Color) {
        self.background = Some(color);
    }

    async fn initialize(&mut self, user_data_dir: &Path, _settings: &BrowserSettings) -> Result<()> {
        tokio::fs::create_dir_all(user_data_dir).await?;
        Ok(())
    }

    fn set_resource_policy(&mut self, policy: ResourcePolicy) -> Result<()> {
        self.policy = Some(policy);
        Ok(())
    }

    async fn navigate(&mut self, document: &Url) -> Result<()> {
        self.view = View::Document(document.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.view = View::Empty;
    }

    fn show_message(&mut self, message: &str) {
        self.view = View::Message(message.to_string());
    }
}
