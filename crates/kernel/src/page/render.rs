//! Settings page rendering with embedded Tera templates.
//!
//! Labels, titles and feedback text are autoescaped. Tab bodies and nonce
//! fields are inserted as trusted markup.

use serde::Serialize;
use tera::{Context, Tera};
use tracing::{debug, error};

use crate::nonce::{NONCE_FIELD, REFERER_FIELD};

use super::feedback::FeedbackMessage;

const PAGE_TEMPLATE: &str = "settings/page.html";
const NONCE_TEMPLATE: &str = "settings/nonce.html";

/// One navigation link.
#[derive(Debug, Clone, Serialize)]
pub struct TabLink {
    pub key: String,
    pub label: String,
    pub url: String,
    pub active: bool,
}

/// A feedback message as the template sees it.
#[derive(Debug, Clone, Serialize)]
struct FeedbackView<'a> {
    text: &'a str,
    css_class: &'static str,
}

/// Data for one rendered page.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub page_id: &'a str,
    pub page_name: &'a str,
    pub active_tab: &'a str,
    /// Label of the active tab (the raw key when the tab is unknown).
    pub tab_label: &'a str,
    pub tabs: Vec<TabLink>,
    /// `None` when no handler is registered for the active tab.
    pub body: Option<String>,
    pub feedback: &'a [FeedbackMessage],
    pub nonce_fields: String,
}

/// Template engine for settings pages.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Create a renderer with the built-in templates.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                PAGE_TEMPLATE,
                include_str!("../../templates/settings/page.html"),
            ),
            (
                NONCE_TEMPLATE,
                include_str!("../../templates/settings/nonce.html"),
            ),
        ])?;

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self { tera })
    }

    /// Render the full page.
    pub fn render_page(&self, view: &PageView<'_>) -> String {
        let feedback: Vec<FeedbackView<'_>> = view
            .feedback
            .iter()
            .map(|m| FeedbackView {
                text: &m.text,
                css_class: m.kind.css_class(),
            })
            .collect();

        let mut context = Context::new();
        context.insert("page_id", view.page_id);
        context.insert("page_name", view.page_name);
        context.insert("active_tab", view.active_tab);
        context.insert("tab_label", view.tab_label);
        context.insert("tabs", &view.tabs);
        context.insert("has_handler", &view.body.is_some());
        context.insert("body", view.body.as_deref().unwrap_or_default());
        context.insert("feedback", &feedback);
        context.insert("nonce_fields", &view.nonce_fields);

        self.render(PAGE_TEMPLATE, &context)
    }

    /// Render the hidden nonce and referer fields.
    pub fn render_nonce_fields(&self, token: &str, referer: &str) -> String {
        let mut context = Context::new();
        context.insert("nonce_field", NONCE_FIELD);
        context.insert("referer_field", REFERER_FIELD);
        context.insert("token", token);
        context.insert("referer", referer);

        self.render(NONCE_TEMPLATE, &context)
    }

    fn render(&self, template: &str, context: &Context) -> String {
        match self.tera.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                error!(error = ?e, template = %template, "failed to render template");
                format!(
                    "<div class=\"error notice\"><p>Template error: {}</p></div>",
                    html_escape(&e.to_string())
                )
            }
        }
    }
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer").finish_non_exhaustive()
    }
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
