//! Network and feature lock-down for the embedded browser.

use url::Url;

/// Hosts the map document may reach: the Leaflet CDN and the tile servers
pub const ALLOWED_HOSTS: [&str; 2] = ["unpkg.com", "openstreetmap.org"];

pub const BLOCKED_STATUS: u16 = 403;
pub const BLOCKED_REASON: &str = "Forbidden";

/// Outcome of inspecting a single resource request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDecision {
    Allow,
    Block { status: u16, reason: &'static str },
}

impl ResourceDecision {
    fn blocked() -> Self {
        ResourceDecision::Block {
            status: BLOCKED_STATUS,
            reason: BLOCKED_REASON,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, ResourceDecision::Allow)
    }
}

/// Allow-list applied to every request made by the preview document
#[derive(Debug, Clone)]
pub struct ResourcePolicy {
    document: Url,
    allowed_hosts: Vec<String>,
}

impl ResourcePolicy {
    /// Policy for the given generated document and the default map hosts
    pub fn for_document(document: Url) -> Self {
        Self {
            document,
            allowed_hosts: ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }

    pub fn document(&self) -> &Url {
        &self.document
    }

    /// Decide whether a request URI may be loaded
    ///
    /// Allowed: the generated document itself, `data:` URIs and anything
    /// served by an allow-listed host or one of its subdomains.
    pub fn evaluate(&self, uri: &str) -> ResourceDecision {
        let Ok(url) = Url::parse(uri) else {
            tracing::debug!(target: "preview::policy", uri = %uri, "Blocking unparseable request");
            return ResourceDecision::blocked();
        };

        if url.scheme().eq_ignore_ascii_case("data") || url == self.document {
            return ResourceDecision::Allow;
        }

        if let Some(host) = url.host_str() {
            if self.allowed_hosts.iter().any(|allowed| host_matches(host, allowed)) {
                return ResourceDecision::Allow;
            }
        }

        tracing::debug!(target: "preview::policy", uri = %uri, "Blocking request");
        ResourceDecision::blocked()
    }
}

fn host_matches(host: &str, allowed: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host == allowed {
        return true;
    }
    host.strip_suffix(allowed)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Browser feature switches applied before the document is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub script_dialogs: bool,
    pub context_menus: bool,
    pub dev_tools: bool,
    pub host_objects: bool,
    pub general_autofill: bool,
    pub password_autosave: bool,
    pub scripts: bool,
    pub web_messages: bool,
    /// Extra command line passed to the browser process
    pub additional_arguments: String,
}

impl BrowserSettings {
    /// Everything off except scripts (the map needs them) and context menus
    pub fn locked_down() -> Self {
        Self {
            script_dialogs: false,
            context_menus: true,
            dev_tools: false,
            host_objects: false,
            general_autofill: false,
            password_autosave: false,
            scripts: true,
            web_messages: false,
            additional_arguments: "--block-new-web-contents".to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self::locked_down()
    }
}
