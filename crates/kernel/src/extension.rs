//! Page extensions - per-page extension points.
//!
//! Extensions let code outside a page's own definition adjust its
//! configuration before finalization, print markup around a tab body, and
//! filter the rendered tab body. Each page keeps its own ordered list;
//! extensions are called in weight order (lower = earlier).

use std::sync::Arc;

use tracing::debug;

use crate::page::PageConfig;

/// Extension point implemented by code that customizes a settings page.
///
/// Every method has a no-op default, so implementors only override the
/// points they need.
pub trait PageExtension: Send + Sync {
    /// Name used in log output.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Adjust the page configuration before it is finalized.
    fn alter_config(&self, _page_id: &str, _config: &mut PageConfig) {}

    /// Append markup before the tab body.
    fn before_tab(&self, _page_id: &str, _tab: &str, _out: &mut String) {}

    /// Append markup after the tab body.
    fn after_tab(&self, _page_id: &str, _tab: &str, _out: &mut String) {}

    /// Filter the captured tab markup (before-hook output, body and
    /// after-hook output).
    fn filter_body(&self, _page_id: &str, _tab: &str, html: String) -> String {
        html
    }
}

/// A registered extension with its ordering weight.
#[derive(Clone)]
pub struct ExtensionHandler {
    /// The extension.
    pub extension: Arc<dyn PageExtension>,
    /// Weight for ordering (lower = called first).
    pub weight: i32,
}

/// Ordered list of extensions attached to one page.
#[derive(Clone, Default)]
pub struct Extensions {
    handlers: Vec<ExtensionHandler>,
}

impl Extensions {
    /// Create an empty extension list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension. Equal weights keep registration order.
    pub fn register(&mut self, weight: i32, extension: Arc<dyn PageExtension>) {
        debug!(extension = %extension.name(), weight, "registered page extension");
        self.handlers.push(ExtensionHandler { extension, weight });
        self.handlers.sort_by_key(|h| h.weight);
    }

    /// Run every `alter_config` in weight order.
    pub fn alter_config(&self, page_id: &str, config: &mut PageConfig) {
        for handler in &self.handlers {
            handler.extension.alter_config(page_id, config);
        }
    }

    /// Run every `before_tab` in weight order.
    pub fn before_tab(&self, page_id: &str, tab: &str, out: &mut String) {
        for handler in &self.handlers {
            handler.extension.before_tab(page_id, tab, out);
        }
    }

    /// Run every `after_tab` in weight order.
    pub fn after_tab(&self, page_id: &str, tab: &str, out: &mut String) {
        for handler in &self.handlers {
            handler.extension.after_tab(page_id, tab, out);
        }
    }

    /// Fold the tab markup through every `filter_body` in weight order.
    pub fn filter_body(&self, page_id: &str, tab: &str, html: String) -> String {
        self.handlers.iter().fold(html, |acc, handler| {
            handler.extension.filter_body(page_id, tab, acc)
        })
    }

    /// Get registered handlers, in weight order.
    pub fn handlers(&self) -> &[ExtensionHandler] {
        &self.handlers
    }

    /// Get extension count.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no extensions are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.handlers
                    .iter()
                    .map(|h| (h.extension.name().to_string(), h.weight)),
            )
            .finish()
    }
}
