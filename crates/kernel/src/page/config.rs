//! Page configuration: typed record, partial options, and definition files.
//!
//! [`PageOptions`] is the partial form accepted by `configure` and by page
//! definition files; every field is optional and unset fields keep the
//! defaults of [`PageConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::ADMIN_CAPABILITY;

/// Default page title.
pub const DEFAULT_PAGE_NAME: &str = "Settings Page";

/// Default page slug.
pub const DEFAULT_PAGE_SLUG: &str = "settings_page";

/// Admin entry script that page URLs are relative to.
pub const ADMIN_SCRIPT: &str = "admin.php";

/// A settings tab: key, navigation label, and optional static content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub key: String,
    pub label: String,
    /// Static body markup, used by tabs declared in definition files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Tab {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            content: None,
        }
    }
}

/// Ordered tab list; insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabSet(Vec<Tab>);

impl TabSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tab.
    pub fn with(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.0.push(Tab::new(key, label));
        self
    }

    /// Append a tab.
    pub fn push(&mut self, tab: Tab) {
        self.0.push(tab);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|t| t.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Tab> {
        self.0.iter().find(|t| t.key == key)
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.get(key).map(|t| t.label.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn first_key(&self) -> Option<&str> {
        self.0.first().map(|t| t.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TabSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| Tab::new(k, v)).collect())
    }
}

/// Finalized page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageConfig {
    /// Capability required to open the page.
    pub capability: String,
    /// Page title.
    pub page_name: String,
    /// Unique slug used in URLs and nonce actions.
    pub page_slug: String,
    /// Nest the page under this menu entry instead of the top level.
    pub parent_slug: Option<String>,
    /// Top-level menu icon.
    pub icon: Option<String>,
    /// Top-level menu position.
    pub position: Option<i32>,
    /// Tab shown when the request names none.
    pub default_tab: Option<String>,
    /// Add one submenu link per tab.
    pub show_tabs_in_menu: bool,
    pub tabs: TabSet,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            capability: ADMIN_CAPABILITY.to_string(),
            page_name: DEFAULT_PAGE_NAME.to_string(),
            page_slug: DEFAULT_PAGE_SLUG.to_string(),
            parent_slug: None,
            icon: None,
            position: None,
            default_tab: None,
            show_tabs_in_menu: true,
            tabs: TabSet::new(),
        }
    }
}

impl PageConfig {
    /// Overlay the set fields of `options`. Empty strings for optional
    /// fields count as unset.
    pub fn apply(&mut self, options: PageOptions) {
        if let Some(capability) = options.capability {
            self.capability = capability;
        }
        if let Some(page_name) = options.page_name {
            self.page_name = page_name;
        }
        if let Some(page_slug) = options.page_slug {
            self.page_slug = page_slug;
        }
        if let Some(parent_slug) = options.parent_slug {
            self.parent_slug = non_empty(parent_slug);
        }
        if let Some(icon) = options.icon {
            self.icon = non_empty(icon);
        }
        if options.position.is_some() {
            self.position = options.position;
        }
        if let Some(default_tab) = options.default_tab {
            self.default_tab = non_empty(default_tab);
        }
        if let Some(show) = options.show_tabs_in_menu {
            self.show_tabs_in_menu = show;
        }
        if let Some(tabs) = options.tabs {
            self.tabs = tabs;
        }
    }

    /// Check the invariants active-tab resolution and URL building rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let slug_ok = !self.page_slug.is_empty()
            && self
                .page_slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !slug_ok {
            return Err(ConfigError::InvalidSlug(self.page_slug.clone()));
        }

        if self.tabs.is_empty() {
            return Err(ConfigError::NoTabs(self.page_slug.clone()));
        }

        let mut seen = std::collections::HashSet::new();
        for key in self.tabs.keys() {
            if key.is_empty() {
                return Err(ConfigError::EmptyTabKey(self.page_slug.clone()));
            }
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateTab {
                    page: self.page_slug.clone(),
                    tab: key.to_string(),
                });
            }
        }

        if let Some(default_tab) = &self.default_tab
            && !self.tabs.contains(default_tab)
        {
            return Err(ConfigError::UnknownDefaultTab {
                page: self.page_slug.clone(),
                tab: default_tab.clone(),
            });
        }

        Ok(())
    }

    /// URL of the page without a tab parameter.
    pub fn base_url(&self) -> String {
        format!(
            "{ADMIN_SCRIPT}?page={}",
            urlencoding::encode(&self.page_slug)
        )
    }

    /// URL of the page with `tab` selected.
    pub fn tab_url(&self, tab: &str) -> String {
        format!("{}&tab={}", self.base_url(), urlencoding::encode(tab))
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Partial configuration; unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageOptions {
    pub capability: Option<String>,
    pub page_name: Option<String>,
    pub page_slug: Option<String>,
    pub parent_slug: Option<String>,
    pub icon: Option<String>,
    pub position: Option<i32>,
    pub default_tab: Option<String>,
    pub show_tabs_in_menu: Option<bool>,
    pub tabs: Option<TabSet>,
}

/// A page definition file: page identity plus options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageDefinition {
    /// Page identity used by extensions and diagnostics. Defaults to the slug.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub options: PageOptions,
}

impl PageDefinition {
    /// Parse a TOML definition.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a YAML definition.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a definition file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let source = std::fs::read_to_string(path)?;

        match extension.as_str() {
            "toml" => Self::from_toml_str(&source),
            "yaml" | "yml" => Self::from_yaml_str(&source),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Page identity: the explicit id, else the slug, else the default slug.
    pub fn page_id(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.options.page_slug.clone())
            .unwrap_or_else(|| DEFAULT_PAGE_SLUG.to_string())
    }
}
