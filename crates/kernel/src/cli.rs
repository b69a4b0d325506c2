//! CLI command implementations for previewing page definitions.
//!
//! These commands build pages from definition files against a local
//! [`AdminHost`] and print the result, without any web server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::config::Config;
use crate::host::{AdminHost, AdminRequest, PAGE_PARAM, UserContext};
use crate::page::{PageBuilder, PageDefinition, SettingsPage, TAB_PARAM};

/// Session token used for requests issued from the command line.
const CLI_SESSION: &str = "cli";

/// `--user` value that previews the page signed out.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Load a definition file and build its page against `host`.
pub fn load_page(host: &AdminHost, path: &Path) -> Result<Arc<SettingsPage>> {
    let definition = PageDefinition::load(path)
        .with_context(|| format!("failed to load page definition {}", path.display()))?;
    let page = PageBuilder::from_definition(definition)
        .nonces(host.nonces())
        .build()
        .with_context(|| format!("invalid page definition {}", path.display()))?;
    Ok(Arc::new(page))
}

/// The user a CLI request runs as.
///
/// Without `user` this holds exactly the page's capability. Otherwise
/// `user` is a comma-separated capability list, or `anonymous`.
pub fn preview_user(page: &SettingsPage, user: Option<&str>) -> UserContext {
    let capabilities = match user.map(str::trim) {
        None => vec![page.config().capability.clone()],
        Some(ANONYMOUS_USER) => return UserContext::anonymous(),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
    };
    UserContext::authenticated(Uuid::nil(), CLI_SESSION, capabilities)
}

/// Render a page through the host as `user` would see it.
pub fn render_html(
    config: &Config,
    path: &Path,
    tab: Option<&str>,
    user: Option<&str>,
) -> Result<String> {
    let host = AdminHost::from_config(config).context("failed to create admin host")?;
    let page = load_page(&host, path)?;
    host.register_page(&page);

    let mut req = AdminRequest::new(preview_user(&page, user))
        .with_query(PAGE_PARAM, page.config().page_slug.clone());
    if let Some(tab) = tab {
        req = req.with_query(TAB_PARAM, tab);
    }

    let html = host.handle(&req).context("failed to render page")?;
    Ok(html)
}

/// Render a page as HTML, optionally with a tab selected.
pub fn cmd_render(
    config: &Config,
    path: &Path,
    tab: Option<&str>,
    user: Option<&str>,
) -> Result<()> {
    let html = render_html(config, path, tab, user)?;
    println!("{html}");
    Ok(())
}

/// Print the menu tree built from one or more definition files as JSON.
pub fn cmd_menu(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let host = AdminHost::from_config(config).context("failed to create admin host")?;
    for path in paths {
        let page = load_page(&host, path)?;
        host.register_page(&page);
    }

    let json = serde_json::to_string_pretty(&host.menus().tree())
        .context("failed to serialize menu tree")?;
    println!("{json}");
    Ok(())
}

/// Print the nonce action and a token for a tab.
pub fn cmd_nonce(config: &Config, path: &Path, tab: &str) -> Result<()> {
    let host = AdminHost::from_config(config).context("failed to create admin host")?;
    let page = load_page(&host, path)?;

    let action = page.nonce_action_for(tab);
    let token = host.nonces().create(&action, &preview_user(&page, None));

    println!("{:<8} {action}", "ACTION");
    println!("{:<8} {token}", "TOKEN");
    Ok(())
}
