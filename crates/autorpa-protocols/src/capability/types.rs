//! Value types exchanged with a capability provider.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

handle!(
    /// Opaque reference to a launched browser engine.
    BrowserHandle
);
handle!(
    /// Opaque reference to a browsing context inside a browser.
    ContextHandle
);
handle!(
    /// Opaque reference to a page (tab).
    PageHandle
);
handle!(
    /// Opaque reference to one element matched by a query.
    ElementHandle
);

/// Normalized browser engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Chromium,
    Firefox,
    Webkit,
}

/// Result of normalizing a user-facing browser name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSelection {
    /// One of the engines the provider can drive.
    Engine(EngineKind),
    /// No matching engine; hand the URL to the OS default handler.
    External,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Chromium => "chromium",
            EngineKind::Firefox => "firefox",
            EngineKind::Webkit => "webkit",
        }
    }

    /// Map a user-facing browser choice onto an engine family.
    ///
    /// "edge" has no engine of its own and collapses onto chromium.
    pub fn normalize(requested: &str) -> EngineSelection {
        match requested.trim().to_ascii_lowercase().as_str() {
            "" | "chrome" | "chromium" | "edge" | "msedge" => {
                EngineSelection::Engine(EngineKind::Chromium)
            }
            "firefox" => EngineSelection::Engine(EngineKind::Firefox),
            "safari" | "webkit" => EngineSelection::Engine(EngineKind::Webkit),
            _ => EngineSelection::External,
        }
    }

    /// Whether `requested` names a browser that is silently folded into
    /// another engine family.
    pub fn is_collapsed_alias(requested: &str) -> bool {
        matches!(
            requested.trim().to_ascii_lowercase().as_str(),
            "edge" | "msedge"
        )
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation completion condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[default]
    #[serde(rename = "networkidle")]
    NetworkIdle,
    Commit,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle => "networkidle",
            WaitUntil::Commit => "commit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "load" => Some(WaitUntil::Load),
            "domcontentloaded" => Some(WaitUntil::DomContentLoaded),
            "networkidle" => Some(WaitUntil::NetworkIdle),
            "commit" => Some(WaitUntil::Commit),
            _ => None,
        }
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Requested window state for a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    #[default]
    Default,
    Maximized,
    Fullscreen,
    Custom { width: u32, height: u32 },
}

impl WindowState {
    /// Extra engine launch arguments for this window state.
    pub fn launch_args(&self) -> Vec<String> {
        match self {
            WindowState::Default => vec![],
            WindowState::Maximized => vec!["--start-maximized".to_string()],
            WindowState::Fullscreen => vec!["--start-fullscreen".to_string()],
            WindowState::Custom { width, height } => {
                vec![format!("--window-size={},{}", width, height)]
            }
        }
    }

    /// Context viewport for this window state. `None` lets the page follow
    /// the window size.
    pub fn viewport(&self, default: Viewport) -> Option<Viewport> {
        match self {
            WindowState::Default => Some(default),
            WindowState::Maximized | WindowState::Fullscreen => None,
            WindowState::Custom { width, height } => Some(Viewport::new(*width, *height)),
        }
    }
}

/// Engine launch options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    pub headless: bool,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Browsing context options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextOptions {
    pub viewport: Option<Viewport>,
    /// Isolated (incognito-like) storage.
    pub isolated: bool,
}

/// Navigation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GotoOptions {
    pub wait_until: WaitUntil,
    pub timeout_ms: u64,
}

impl Default for GotoOptions {
    fn default() -> Self {
        Self {
            wait_until: WaitUntil::default(),
            timeout_ms: 30000,
        }
    }
}

/// Click options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOptions {
    pub click_count: u32,
    /// Treat the click as complete only once the navigation it triggers finishes.
    pub wait_for_navigation: bool,
    pub timeout_ms: u64,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            click_count: 1,
            wait_for_navigation: false,
            timeout_ms: 30000,
        }
    }
}

/// What to read from a matched element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractKind {
    Text,
    Html,
    Attribute(String),
    Value,
}

impl ExtractKind {
    /// Parse an extraction kind, falling back to `Text` for anything unknown.
    pub fn parse_lenient(kind: &str, attribute_name: &str) -> Self {
        match kind {
            "html" => ExtractKind::Html,
            "attribute" => ExtractKind::Attribute(attribute_name.to_string()),
            "value" => ExtractKind::Value,
            _ => ExtractKind::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractKind::Text => "text",
            ExtractKind::Html => "html",
            ExtractKind::Attribute(_) => "attribute",
            ExtractKind::Value => "value",
        }
    }
}

/// Element geometry in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
