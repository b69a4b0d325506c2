//! Menu registry - collects admin menu entries and their render callbacks.
//!
//! Pages register themselves during the host's menu-building phase. The
//! registry is owned by the host; nothing here is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::host::AdminRequest;

/// Callback invoked when the host routes a request to a menu entry.
pub type RenderCallback = Arc<dyn Fn(&AdminRequest) -> String + Send + Sync>;

/// A top-level or submenu admin page entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MenuEntry {
    /// Title shown in the browser and page heading.
    pub page_title: String,
    /// Label shown in the menu.
    pub menu_title: String,
    /// Capability required to see and open the page.
    pub capability: String,
    /// Unique page slug (`admin.php?page=<slug>`).
    pub slug: String,
    /// Parent slug for submenu entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Icon name or URI (top-level only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Menu position (top-level only, lower = higher).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl MenuEntry {
    /// Create an entry using the same text for page and menu title.
    pub fn new(
        title: impl Into<String>,
        capability: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            page_title: title.clone(),
            menu_title: title,
            capability: capability.into(),
            slug: slug.into(),
            parent: None,
            icon: None,
            position: None,
        }
    }

    /// Set the menu icon.
    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    /// Set the menu position.
    pub fn position(mut self, position: Option<i32>) -> Self {
        self.position = position;
        self
    }
}

/// A plain link shown under a menu entry (e.g. one per settings tab).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmenuLink {
    pub label: String,
    pub capability: String,
    pub url: String,
}

/// Serializable view of the registry.
#[derive(Debug, Clone, Serialize)]
pub struct MenuTree {
    pub entry: MenuEntry,
    pub links: Vec<SubmenuLink>,
    pub children: Vec<MenuTree>,
}

struct Registered {
    entry: MenuEntry,
    callback: RenderCallback,
    /// Registration sequence, used as the tie-breaker when sorting.
    seq: usize,
}

/// Registry of admin menu entries, submenu entries and submenu links.
pub struct MenuRegistry {
    /// All entries, indexed by slug.
    entries: HashMap<String, Registered>,
    /// Child slugs per parent slug, in registration order.
    children: HashMap<String, Vec<String>>,
    /// Submenu links per parent slug, in registration order.
    links: HashMap<String, Vec<SubmenuLink>>,
    next_seq: usize,
}

impl MenuRegistry {
    /// Create an empty menu registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            children: HashMap::new(),
            links: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Register a top-level menu entry.
    pub fn add_top_level(&mut self, mut entry: MenuEntry, callback: RenderCallback) {
        entry.parent = None;
        debug!(slug = %entry.slug, position = ?entry.position, "registered top-level menu");
        self.insert(entry, callback);
    }

    /// Register a submenu entry under `parent`.
    ///
    /// The parent does not need to exist yet; hosts may register children
    /// before the parent page.
    pub fn add_submenu(&mut self, parent: &str, mut entry: MenuEntry, callback: RenderCallback) {
        entry.parent = Some(parent.to_string());
        entry.icon = None;
        entry.position = None;

        let children = self.children.entry(parent.to_string()).or_default();
        if !children.contains(&entry.slug) {
            children.push(entry.slug.clone());
        }

        debug!(slug = %entry.slug, parent = %parent, "registered submenu");
        self.insert(entry, callback);
    }

    /// Append a link under `parent`.
    pub fn add_submenu_link(&mut self, parent: &str, link: SubmenuLink) {
        self.links.entry(parent.to_string()).or_default().push(link);
    }

    fn insert(&mut self, entry: MenuEntry, callback: RenderCallback) {
        let seq = self.next_seq;
        self.next_seq += 1;

        if let Some(previous) = self.entries.get(&entry.slug) {
            warn!(slug = %entry.slug, "replacing existing menu entry");
            if previous.entry.parent != entry.parent
                && let Some(old_parent) = &previous.entry.parent
                && let Some(siblings) = self.children.get_mut(old_parent)
            {
                siblings.retain(|s| s != &entry.slug);
            }
        }

        self.entries.insert(
            entry.slug.clone(),
            Registered {
                entry,
                callback,
                seq,
            },
        );
    }

    /// Get an entry by its slug.
    pub fn get(&self, slug: &str) -> Option<&MenuEntry> {
        self.entries.get(slug).map(|r| &r.entry)
    }

    /// Get the render callback for a slug.
    pub fn callback(&self, slug: &str) -> Option<RenderCallback> {
        self.entries.get(slug).map(|r| Arc::clone(&r.callback))
    }

    /// Invoke the render callback registered for `slug`.
    pub fn render(&self, slug: &str, request: &AdminRequest) -> Option<String> {
        self.entries.get(slug).map(|r| (r.callback)(request))
    }

    /// Top-level entries, ordered by position (unpositioned last), then by
    /// registration order.
    pub fn top_level(&self) -> Vec<&MenuEntry> {
        let mut roots: Vec<&Registered> = self
            .entries
            .values()
            .filter(|r| r.entry.parent.is_none())
            .collect();
        roots.sort_by_key(|r| (r.entry.position.is_none(), r.entry.position, r.seq));
        roots.into_iter().map(|r| &r.entry).collect()
    }

    /// Submenu entries whose parent slug has no registered entry, in
    /// registration order.
    pub fn orphans(&self) -> Vec<&MenuEntry> {
        let mut orphans: Vec<&Registered> = self
            .entries
            .values()
            .filter(|r| {
                r.entry
                    .parent
                    .as_deref()
                    .is_some_and(|parent| !self.entries.contains_key(parent))
            })
            .collect();
        orphans.sort_by_key(|r| r.seq);
        orphans.into_iter().map(|r| &r.entry).collect()
    }

    /// Submenu entries registered under `parent`.
    pub fn submenus_of(&self, parent: &str) -> Vec<&MenuEntry> {
        self.children
            .get(parent)
            .map(|slugs| slugs.iter().filter_map(|s| self.get(s)).collect())
            .unwrap_or_default()
    }

    /// Submenu links registered under `parent`.
    pub fn links_for(&self, parent: &str) -> &[SubmenuLink] {
        self.links.get(parent).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Build a serializable tree rooted at the top-level entries.
    ///
    /// Orphaned submenu entries follow the top-level roots, each still
    /// carrying its missing `parent`.
    pub fn tree(&self) -> Vec<MenuTree> {
        let orphans = self.orphans();
        for orphan in &orphans {
            warn!(
                slug = %orphan.slug,
                parent = orphan.parent.as_deref().unwrap_or_default(),
                "submenu entry has no registered parent"
            );
        }

        self.top_level()
            .into_iter()
            .chain(orphans)
            .map(|entry| self.subtree(entry))
            .collect()
    }

    fn subtree(&self, entry: &MenuEntry) -> MenuTree {
        MenuTree {
            entry: entry.clone(),
            links: self.links_for(&entry.slug).to_vec(),
            children: self
                .submenus_of(&entry.slug)
                .into_iter()
                .filter(|child| child.slug != entry.slug)
                .map(|child| self.subtree(child))
                .collect(),
        }
    }

    /// Get entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MenuRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MenuRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuRegistry")
            .field("entries", &self.entries.len())
            .field("children", &self.children)
            .field("links", &self.links)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn callback(body: &'static str) -> RenderCallback {
        Arc::new(move |_req: &AdminRequest| body.to_string())
    }

    #[test]
    fn top_level_entry_drops_parent() {
        let mut registry = MenuRegistry::new();
        let mut entry = MenuEntry::new("Demo", "administer site", "demo");
        entry.parent = Some("ignored".to_string());
        registry.add_top_level(entry, callback("demo"));

        let stored = registry.get("demo").unwrap();
        assert!(stored.parent.is_none());
        assert_eq!(registry.top_level().len(), 1);
    }

    #[test]
    fn submenu_is_nested_under_parent() {
        let mut registry = MenuRegistry::new();
        registry.add_top_level(
            MenuEntry::new("Tools", "administer site", "tools"),
            callback("tools"),
        );
        registry.add_submenu(
            "tools",
            MenuEntry::new("Demo", "administer site", "demo").position(Some(3)),
            callback("demo"),
        );

        let children = registry.submenus_of("tools");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].slug, "demo");
        assert_eq!(children[0].parent.as_deref(), Some("tools"));
        assert!(children[0].position.is_none());
        assert_eq!(registry.top_level().len(), 1);
    }

    #[test]
    fn top_level_sorted_by_position_then_registration() {
        let mut registry = MenuRegistry::new();
        registry.add_top_level(MenuEntry::new("C", "x", "c"), callback("c"));
        registry.add_top_level(MenuEntry::new("B", "x", "b").position(Some(20)), callback("b"));
        registry.add_top_level(MenuEntry::new("A", "x", "a").position(Some(10)), callback("a"));
        registry.add_top_level(MenuEntry::new("D", "x", "d"), callback("d"));

        let slugs: Vec<_> = registry.top_level().iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn links_keep_registration_order() {
        let mut registry = MenuRegistry::new();
        for (label, url) in [("General", "g"), ("Advanced", "a")] {
            registry.add_submenu_link(
                "demo",
                SubmenuLink {
                    label: label.to_string(),
                    capability: "administer site".to_string(),
                    url: url.to_string(),
                },
            );
        }

        let labels: Vec<_> = registry
            .links_for("demo")
            .iter()
            .map(|l| l.label.as_str())
            .collect();
        assert_eq!(labels, vec!["General", "Advanced"]);
        assert!(registry.links_for("other").is_empty());
    }

    #[test]
    fn render_dispatches_to_callback() {
        let mut registry = MenuRegistry::new();
        registry.add_top_level(MenuEntry::new("Demo", "x", "demo"), callback("<p>demo</p>"));

        let req = AdminRequest::default();
        assert_eq!(registry.render("demo", &req).as_deref(), Some("<p>demo</p>"));
        assert!(registry.render("nope", &req).is_none());
    }

    #[test]
    fn tree_serializes_nested_entries() {
        let mut registry = MenuRegistry::new();
        registry.add_top_level(MenuEntry::new("Tools", "x", "tools"), callback("t"));
        registry.add_submenu("tools", MenuEntry::new("Demo", "x", "demo"), callback("d"));

        let json = serde_json::to_value(registry.tree()).unwrap();
        assert_eq!(json[0]["entry"]["slug"], "tools");
        assert_eq!(json[0]["children"][0]["entry"]["slug"], "demo");
        assert_eq!(json[0]["children"][0]["entry"]["parent"], "tools");
    }

    #[test]
    fn tree_keeps_entries_with_missing_parent() {
        let mut registry = MenuRegistry::new();
        registry.add_top_level(MenuEntry::new("Demo", "x", "demo"), callback("d"));
        registry.add_submenu(
            "tools",
            MenuEntry::new("Maintenance", "x", "maintenance"),
            callback("m"),
        );

        let orphans = registry.orphans();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].slug, "maintenance");

        let tree = registry.tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].entry.slug, "demo");
        assert_eq!(tree[1].entry.slug, "maintenance");
        assert_eq!(tree[1].entry.parent.as_deref(), Some("tools"));

        registry.add_top_level(MenuEntry::new("Tools", "x", "tools"), callback("t"));
        assert!(registry.orphans().is_empty());
        assert_eq!(registry.tree().len(), 2);
    }
}
