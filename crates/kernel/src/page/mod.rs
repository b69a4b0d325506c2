//! Tabbed admin settings pages.
//!
//! A settings page is:
//! - A validated [`PageConfig`] (slug, title, capability, ordered tabs)
//! - One [`TabHandler`] per implemented tab, supplying render and save logic
//! - Optional [`PageExtension`](crate::extension::PageExtension)s that adjust
//!   configuration and wrap or filter tab markup
//! - Nonce-protected form submission with request-scoped [`Feedback`]

mod config;
mod feedback;
mod render;
mod settings;
mod tab;

pub use config::{
    ADMIN_SCRIPT, DEFAULT_PAGE_NAME, DEFAULT_PAGE_SLUG, PageConfig, PageDefinition, PageOptions,
    Tab, TabSet,
};
pub use feedback::{Feedback, FeedbackKind, FeedbackMessage};
pub use render::{PageRenderer, TabLink, html_escape};
pub use settings::{PageBuilder, SettingsPage, SubmissionOutcome, TAB_PARAM};
pub use tab::{FnTab, StaticTab, TabContext, TabHandler};
