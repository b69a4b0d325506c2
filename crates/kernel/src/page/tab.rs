//! Tab handlers: the render/save pair registered for each tab key.

use crate::host::AdminRequest;

use super::config::PageConfig;
use super::feedback::Feedback;

/// Everything a tab handler can see while rendering or saving.
pub struct TabContext<'a> {
    page_id: &'a str,
    config: &'a PageConfig,
    tab: &'a str,
    request: &'a AdminRequest,
    feedback: &'a mut Feedback,
}

impl<'a> TabContext<'a> {
    pub(crate) fn new(
        page_id: &'a str,
        config: &'a PageConfig,
        tab: &'a str,
        request: &'a AdminRequest,
        feedback: &'a mut Feedback,
    ) -> Self {
        Self {
            page_id,
            config,
            tab,
            request,
            feedback,
        }
    }

    /// Identity of the page the tab belongs to.
    pub fn page_id(&self) -> &str {
        self.page_id
    }

    pub fn config(&self) -> &PageConfig {
        self.config
    }

    /// Active tab key.
    pub fn tab(&self) -> &str {
        self.tab
    }

    pub fn request(&self) -> &AdminRequest {
        self.request
    }

    /// Submitted form field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.request.form_field(name)
    }

    /// Messages pushed so far in this request.
    pub fn feedback(&self) -> &Feedback {
        self.feedback
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.feedback.success(text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.feedback.error(text);
    }
}

/// Render and save logic for one tab.
pub trait TabHandler: Send + Sync {
    /// Produce the markup placed inside the tab's form.
    fn render(&self, ctx: &TabContext<'_>) -> String;

    /// Handle a verified submission. The default reports that no save
    /// logic was provided.
    fn save(&self, ctx: &mut TabContext<'_>) {
        let text = missing_save_message(ctx.page_id(), ctx.tab());
        ctx.error(text);
    }
}

pub(crate) fn missing_save_message(page_id: &str, tab: &str) -> String {
    format!("Override the save handler for tab \"{tab}\" in {page_id}.")
}

type RenderFn = Box<dyn Fn(&TabContext<'_>) -> String + Send + Sync>;
type SaveFn = Box<dyn Fn(&mut TabContext<'_>) + Send + Sync>;

/// Tab handler built from closures.
pub struct FnTab {
    render: RenderFn,
    save: Option<SaveFn>,
}

impl FnTab {
    pub fn new(render: impl Fn(&TabContext<'_>) -> String + Send + Sync + 'static) -> Self {
        Self {
            render: Box::new(render),
            save: None,
        }
    }

    /// Attach save logic.
    pub fn on_save(mut self, save: impl Fn(&mut TabContext<'_>) + Send + Sync + 'static) -> Self {
        self.save = Some(Box::new(save));
        self
    }
}

impl TabHandler for FnTab {
    fn render(&self, ctx: &TabContext<'_>) -> String {
        (self.render)(ctx)
    }

    fn save(&self, ctx: &mut TabContext<'_>) {
        match &self.save {
            Some(save) => save(ctx),
            None => {
                let text = missing_save_message(ctx.page_id(), ctx.tab());
                ctx.error(text);
            }
        }
    }
}

/// Tab with fixed markup, used for tabs declared in definition files.
#[derive(Debug, Clone)]
pub struct StaticTab {
    html: String,
}

impl StaticTab {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl TabHandler for StaticTab {
    fn render(&self, _ctx: &TabContext<'_>) -> String {
        self.html.clone()
    }
}
