//! The tabbed settings page.
//!
//! A [`SettingsPage`] owns its configuration, its tab handlers and its
//! extensions. It is built once, shared as `Arc<SettingsPage>`, and handles
//! each request with fresh [`Feedback`]:
//!
//! ```text
//! request -> has submission? -> verify nonce -> save -> resolve tab -> render
//!                  |                  |
//!                  no                 fails: discard silently
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::config::DEFAULT_NONCE_LIFETIME_SECS;
use crate::error::{ConfigError, PageResult};
use crate::extension::{Extensions, PageExtension};
use crate::host::AdminRequest;
use crate::menu::{MenuEntry, MenuRegistry, RenderCallback, SubmenuLink};
use crate::nonce::{HmacNonce, NONCE_FIELD, NonceService};

use super::config::{PageConfig, PageDefinition, PageOptions, Tab};
use super::feedback::Feedback;
use super::render::{PageRenderer, PageView, TabLink};
use super::tab::{StaticTab, TabContext, TabHandler, missing_save_message};

/// Query parameter selecting the active tab.
pub const TAB_PARAM: &str = "tab";

/// What happened to a request's form body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// No form body, or an empty one.
    NoSubmission,
    /// The nonce was missing or invalid; the body was discarded.
    Rejected,
    /// The active tab's save logic ran.
    Saved,
}

/// A tabbed admin settings page.
pub struct SettingsPage {
    id: String,
    /// Configuration as supplied, before extensions run.
    pending: PageConfig,
    /// Configuration after extensions ran; set on first use.
    config: OnceLock<PageConfig>,
    handlers: HashMap<String, Arc<dyn TabHandler>>,
    extensions: Extensions,
    nonces: Arc<dyn NonceService>,
    renderer: PageRenderer,
}

impl SettingsPage {
    /// Start building a page with the given identity.
    pub fn builder(id: impl Into<String>) -> PageBuilder {
        PageBuilder::new(id)
    }

    /// Identity used by extensions and diagnostics.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The finalized configuration.
    ///
    /// The first call runs every extension's `alter_config`. An override
    /// that fails validation is dropped and the supplied configuration is
    /// used instead.
    pub fn config(&self) -> &PageConfig {
        self.config.get_or_init(|| self.finalize())
    }

    /// Whether the configuration has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.config.get().is_some()
    }

    fn finalize(&self) -> PageConfig {
        let mut config = self.pending.clone();
        self.extensions.alter_config(&self.id, &mut config);

        if config == self.pending {
            return config;
        }

        match config.validate() {
            Ok(()) => {
                info!(page = %self.id, "configuration overridden by extension");
                config
            }
            Err(e) => {
                warn!(page = %self.id, error = %e, "ignoring invalid configuration override");
                self.pending.clone()
            }
        }
    }

    /// Overlay options onto the configuration.
    ///
    /// Finalization is reset, so extensions run again on next use. Invalid
    /// results are rejected and leave the page unchanged.
    pub fn configure(&mut self, options: PageOptions) -> Result<(), ConfigError> {
        let mut config = self.pending.clone();
        config.apply(options);
        config.validate()?;

        self.pending = config;
        self.config = OnceLock::new();
        Ok(())
    }

    /// Attach an extension. Finalization is reset.
    pub fn add_extension(&mut self, weight: i32, extension: Arc<dyn PageExtension>) {
        self.extensions.register(weight, extension);
        self.config = OnceLock::new();
    }

    /// Register a handler for `tab`, replacing any previous one.
    pub fn set_handler(&mut self, tab: impl Into<String>, handler: Arc<dyn TabHandler>) {
        self.handlers.insert(tab.into(), handler);
    }

    /// Whether a handler is registered for `tab`.
    pub fn has_handler(&self, tab: &str) -> bool {
        self.handlers.contains_key(tab)
    }

    /// Menu-building phase: register the menu entry and, when enabled, the
    /// per-tab submenu links.
    pub fn initialize(self: &Arc<Self>, menus: &mut MenuRegistry) {
        self.register_menu(menus);
        self.register_tab_links(menus);
    }

    /// Register the page as a top-level entry, or as a submenu entry when a
    /// parent slug is configured.
    pub fn register_menu(self: &Arc<Self>, menus: &mut MenuRegistry) {
        let config = self.config();
        let page = Arc::clone(self);
        let callback: RenderCallback = Arc::new(move |req: &AdminRequest| page.render_page(req));

        let entry = MenuEntry::new(&config.page_name, &config.capability, &config.page_slug);
        match &config.parent_slug {
            None => menus.add_top_level(
                entry
                    .icon(config.icon.clone())
                    .position(config.position),
                callback,
            ),
            Some(parent) => menus.add_submenu(parent, entry, callback),
        }

        info!(page = %self.id, slug = %config.page_slug, "registered settings page");
    }

    /// Add one submenu link per tab, in tab order. No-op when tabs are not
    /// shown in the menu.
    pub fn register_tab_links(&self, menus: &mut MenuRegistry) {
        let config = self.config();
        if !config.show_tabs_in_menu {
            return;
        }

        for tab in config.tabs.iter() {
            menus.add_submenu_link(
                &config.page_slug,
                SubmenuLink {
                    label: tab.label.clone(),
                    capability: config.capability.clone(),
                    url: config.tab_url(&tab.key),
                },
            );
        }
    }

    /// Resolve the active tab: the `tab` query parameter verbatim, else the
    /// default tab, else the first tab.
    pub fn active_tab(&self, req: &AdminRequest) -> String {
        let config = self.config();

        if let Some(tab) = req.query_param(TAB_PARAM).filter(|t| !t.is_empty()) {
            return tab.to_string();
        }

        if let Some(default_tab) = &config.default_tab {
            return default_tab.clone();
        }

        // Validation guarantees at least one tab.
        config.tabs.first_key().unwrap_or_default().to_string()
    }

    /// Page URL without a tab parameter.
    pub fn base_url(&self) -> String {
        self.config().base_url()
    }

    /// Page URL with `tab` selected.
    pub fn tab_url(&self, tab: &str) -> String {
        self.config().tab_url(tab)
    }

    /// Nonce action for the request's active tab.
    pub fn nonce_action(&self, req: &AdminRequest) -> String {
        self.nonce_action_for(&self.active_tab(req))
    }

    /// Nonce action for a given tab: `save-<slug>:<tab>`.
    ///
    /// `:` never appears in a slug, so actions stay distinct across pages.
    pub fn nonce_action_for(&self, tab: &str) -> String {
        format!("save-{}:{tab}", self.config().page_slug)
    }

    /// Hidden nonce and referer fields for the active tab's form.
    pub fn render_nonce(&self, req: &AdminRequest) -> String {
        let tab = self.active_tab(req);
        let token = self.nonces.create(&self.nonce_action_for(&tab), &req.user);
        self.renderer.render_nonce_fields(&token, &self.tab_url(&tab))
    }

    /// Check the submitted nonce against the active tab's action.
    pub fn verify_nonce(&self, req: &AdminRequest) -> bool {
        let Some(token) = req.form_field(NONCE_FIELD).filter(|t| !t.is_empty()) else {
            return false;
        };
        self.nonces
            .verify(token, &self.nonce_action(req), &req.user)
            .is_some()
    }

    /// Run the active tab's save logic.
    ///
    /// Without a handler, or with a handler that does not override `save`,
    /// an error message is pushed telling the implementer to provide one.
    pub fn save(&self, req: &AdminRequest, feedback: &mut Feedback) {
        let tab = self.active_tab(req);
        match self.handlers.get(&tab) {
            Some(handler) => {
                let mut ctx = TabContext::new(&self.id, self.config(), &tab, req, feedback);
                handler.save(&mut ctx);
            }
            None => feedback.error(missing_save_message(&self.id, &tab)),
        }
    }

    /// Handle a pending form submission, if any.
    ///
    /// A submission with a missing or invalid nonce is discarded without
    /// feedback to the user.
    pub fn process_submission(
        &self,
        req: &AdminRequest,
        feedback: &mut Feedback,
    ) -> SubmissionOutcome {
        if !req.has_submission() {
            return SubmissionOutcome::NoSubmission;
        }

        if !self.verify_nonce(req) {
            warn!(
                page = %self.id,
                tab = %self.active_tab(req),
                user = %req.user.id,
                "discarding submission with missing or invalid nonce"
            );
            return SubmissionOutcome::Rejected;
        }

        debug!(page = %self.id, tab = %self.active_tab(req), "saving settings");
        self.save(req, feedback);
        SubmissionOutcome::Saved
    }

    /// Render the page for a request, processing any submission first.
    pub fn render_page(&self, req: &AdminRequest) -> String {
        let mut feedback = Feedback::new();
        self.process_submission(req, &mut feedback);
        self.render_with_feedback(req, &mut feedback)
    }

    /// Render the page with already-collected feedback.
    pub fn render_with_feedback(&self, req: &AdminRequest, feedback: &mut Feedback) -> String {
        let config = self.config();
        let active_tab = self.active_tab(req);

        let tabs = config
            .tabs
            .iter()
            .map(|tab: &Tab| TabLink {
                key: tab.key.clone(),
                label: tab.label.clone(),
                url: config.tab_url(&tab.key),
                active: tab.key == active_tab,
            })
            .collect();

        let body = self.render_tab_body(&active_tab, req, feedback);
        let nonce_fields = if body.is_some() {
            self.render_nonce(req)
        } else {
            debug!(page = %self.id, tab = %active_tab, "no handler for tab");
            String::new()
        };

        let view = PageView {
            page_id: &self.id,
            page_name: &config.page_name,
            active_tab: &active_tab,
            tab_label: config.tabs.label(&active_tab).unwrap_or(&active_tab),
            tabs,
            body,
            feedback: feedback.messages(),
            nonce_fields,
        };

        self.renderer.render_page(&view)
    }

    /// Before-hooks, handler output and after-hooks, passed through the
    /// body filters. `None` when no handler is registered for `tab`.
    fn render_tab_body(
        &self,
        tab: &str,
        req: &AdminRequest,
        feedback: &mut Feedback,
    ) -> Option<String> {
        let handler = self.handlers.get(tab)?;

        let mut out = String::new();
        self.extensions.before_tab(&self.id, tab, &mut out);
        {
            let ctx = TabContext::new(&self.id, self.config(), tab, req, feedback);
            out.push_str(&handler.render(&ctx));
        }
        self.extensions.after_tab(&self.id, tab, &mut out);

        Some(self.extensions.filter_body(&self.id, tab, out))
    }
}

impl std::fmt::Debug for SettingsPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("SettingsPage")
            .field("id", &self.id)
            .field("config", &self.pending)
            .field("finalized", &self.is_finalized())
            .field("handlers", &handlers)
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Builder for [`SettingsPage`].
pub struct PageBuilder {
    id: String,
    config: PageConfig,
    handlers: HashMap<String, Arc<dyn TabHandler>>,
    extensions: Extensions,
    nonces: Option<Arc<dyn NonceService>>,
}

impl PageBuilder {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: PageConfig::default(),
            handlers: HashMap::new(),
            extensions: Extensions::new(),
            nonces: None,
        }
    }

    /// Start from a definition file. Tabs with static content get a
    /// [`StaticTab`] handler.
    pub fn from_definition(definition: PageDefinition) -> Self {
        let mut builder = Self::new(definition.page_id()).configure(definition.options);
        let static_tabs: Vec<(String, String)> = builder
            .config
            .tabs
            .iter()
            .filter_map(|t| t.content.clone().map(|c| (t.key.clone(), c)))
            .collect();
        for (key, content) in static_tabs {
            builder = builder.handler(key, StaticTab::new(content));
        }
        builder
    }

    /// Overlay options; unset fields keep their current values.
    pub fn configure(mut self, options: PageOptions) -> Self {
        self.config.apply(options);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: PageConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a tab.
    pub fn tab(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.config.tabs.push(Tab::new(key, label));
        self
    }

    /// Register the handler for a tab.
    pub fn handler(self, tab: impl Into<String>, handler: impl TabHandler + 'static) -> Self {
        self.shared_handler(tab, Arc::new(handler))
    }

    /// Register a shared handler for a tab.
    pub fn shared_handler(mut self, tab: impl Into<String>, handler: Arc<dyn TabHandler>) -> Self {
        self.handlers.insert(tab.into(), handler);
        self
    }

    /// Attach an extension.
    pub fn extension(mut self, weight: i32, extension: Arc<dyn PageExtension>) -> Self {
        self.extensions.register(weight, extension);
        self
    }

    /// Use the given nonce service (default: a random-key [`HmacNonce`]).
    pub fn nonces(mut self, nonces: Arc<dyn NonceService>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Validate the configuration and build the page.
    pub fn build(self) -> PageResult<SettingsPage> {
        self.config.validate()?;

        for key in self.handlers.keys() {
            if !self.config.tabs.contains(key) {
                debug!(page = %self.id, tab = %key, "handler registered for a tab outside the navigation");
            }
        }

        let nonces = match self.nonces {
            Some(nonces) => nonces,
            None => Arc::new(HmacNonce::with_random_secret(DEFAULT_NONCE_LIFETIME_SECS)?),
        };

        Ok(SettingsPage {
            id: self.id,
            pending: self.config,
            config: OnceLock::new(),
            handlers: self.handlers,
            extensions: self.extensions,
            nonces,
            renderer: PageRenderer::new()?,
        })
    }
}
