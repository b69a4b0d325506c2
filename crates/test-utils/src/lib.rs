//! Tabset test utilities.
//!
//! Helpers for integration testing: fixed users and nonce keys, the demo
//! page fixture, and handlers/extensions that record how they were called.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tabset_kernel::extension::PageExtension;
use tabset_kernel::host::{ADMIN_CAPABILITY, AdminRequest, UserContext};
use tabset_kernel::nonce::{HmacNonce, NONCE_FIELD, NonceService};
use tabset_kernel::page::{
    FeedbackKind, PageBuilder, PageConfig, SettingsPage, TabContext, TabHandler,
};
use uuid::Uuid;

/// Nonce key shared by every test fixture.
pub const TEST_SECRET: &[u8] = b"tabset-test-secret";

/// A nonce service with a fixed key and the default lifetime.
#[allow(clippy::expect_used)]
pub fn test_nonces() -> Arc<HmacNonce> {
    Arc::new(HmacNonce::new(TEST_SECRET, 86_400).expect("valid test nonce key"))
}

/// An authenticated administrator.
pub fn admin_user() -> UserContext {
    UserContext::authenticated(
        Uuid::from_u128(1),
        "admin-session",
        vec![ADMIN_CAPABILITY.to_string()],
    )
}

/// An authenticated user without capabilities.
pub fn subscriber_user() -> UserContext {
    UserContext::authenticated(Uuid::from_u128(2), "subscriber-session", vec![])
}

/// A view request for `tab` (or the default tab when `None`).
pub fn view_request(tab: Option<&str>) -> AdminRequest {
    let req = AdminRequest::new(admin_user()).with_query("page", "demo");
    match tab {
        Some(tab) => req.with_query("tab", tab),
        None => req,
    }
}

/// A submission for `tab` carrying a valid nonce from `nonces`.
pub fn signed_submission(
    page: &SettingsPage,
    nonces: &dyn NonceService,
    tab: Option<&str>,
) -> AdminRequest {
    let req = view_request(tab);
    let token = nonces.create(&page.nonce_action(&req), &req.user);
    req.with_field(NONCE_FIELD, token)
        .with_field("color", "blue")
}

/// The two-tab `demo` page builder (`general`, `advanced`), with no
/// handlers registered.
pub fn demo_builder(nonces: Arc<dyn NonceService>) -> PageBuilder {
    SettingsPage::builder("DemoSettings")
        .config(PageConfig {
            page_name: "Demo".to_string(),
            page_slug: "demo".to_string(),
            ..PageConfig::default()
        })
        .tab("general", "General")
        .tab("advanced", "Advanced")
        .nonces(nonces)
}

/// Tab handler that counts calls and pushes a fixed message on save.
pub struct CountingTab {
    body: String,
    message: Option<(FeedbackKind, String)>,
    renders: AtomicUsize,
    saves: AtomicUsize,
}

impl CountingTab {
    /// Render `body`; save pushes nothing.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            message: None,
            renders: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    /// Push `text` with `kind` on save.
    pub fn on_save(mut self, kind: FeedbackKind, text: impl Into<String>) -> Self {
        self.message = Some((kind, text.into()));
        self
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl TabHandler for CountingTab {
    fn render(&self, _ctx: &TabContext<'_>) -> String {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.body.clone()
    }

    fn save(&self, ctx: &mut TabContext<'_>) {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if let Some((kind, text)) = &self.message {
            match kind {
                FeedbackKind::Success => ctx.success(text.clone()),
                FeedbackKind::Error => ctx.error(text.clone()),
            }
        }
    }
}

type ConfigOverride = Box<dyn Fn(&mut PageConfig) + Send + Sync>;

/// Extension that records every call as `"<hook>:<page>:<tab>"`.
pub struct RecordingExtension {
    name: String,
    calls: Mutex<Vec<String>>,
    config_override: Option<ConfigOverride>,
}

impl RecordingExtension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
            config_override: None,
        }
    }

    /// Apply `f` to the configuration in `alter_config`.
    pub fn with_override(mut self, f: impl Fn(&mut PageConfig) + Send + Sync + 'static) -> Self {
        self.config_override = Some(Box::new(f));
        self
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl PageExtension for RecordingExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn alter_config(&self, page_id: &str, config: &mut PageConfig) {
        self.record(format!("alter_config:{page_id}"));
        if let Some(f) = &self.config_override {
            f(config);
        }
    }

    fn before_tab(&self, page_id: &str, tab: &str, out: &mut String) {
        self.record(format!("before_tab:{page_id}:{tab}"));
        out.push_str(&format!("<!-- before {} -->", self.name));
    }

    fn after_tab(&self, page_id: &str, tab: &str, out: &mut String) {
        self.record(format!("after_tab:{page_id}:{tab}"));
        out.push_str(&format!("<!-- after {} -->", self.name));
    }

    fn filter_body(&self, page_id: &str, tab: &str, html: String) -> String {
        self.record(format!("filter_body:{page_id}:{tab}"));
        format!("<section class=\"{}\">{html}</section>", self.name)
    }
}
