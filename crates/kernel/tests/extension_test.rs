#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Page extension tests: configuration overrides and tab body hooks.

use std::sync::Arc;

use tabset_kernel::host::AdminHost;
use tabset_kernel::page::TabSet;
use tabset_test_utils::{
    CountingTab, RecordingExtension, demo_builder, test_nonces, view_request,
};

#[test]
fn test_hooks_wrap_tab_body() {
    let extension = Arc::new(RecordingExtension::new("outer"));
    let page = demo_builder(test_nonces())
        .handler("general", CountingTab::new("<p>body</p>"))
        .extension(0, extension.clone())
        .build()
        .unwrap();

    let html = page.render_page(&view_request(None));

    assert!(html.contains(
        "<section class=\"outer\"><!-- before outer --><p>body</p><!-- after outer --></section>"
    ));
    assert_eq!(
        extension.calls(),
        vec![
            "alter_config:DemoSettings",
            "before_tab:DemoSettings:general",
            "after_tab:DemoSettings:general",
            "filter_body:DemoSettings:general",
        ]
    );
}

#[test]
fn test_hooks_run_in_weight_order() {
    let inner = Arc::new(RecordingExtension::new("inner"));
    let outer = Arc::new(RecordingExtension::new("outer"));
    let page = demo_builder(test_nonces())
        .handler("general", CountingTab::new("x"))
        .extension(20, outer.clone())
        .extension(10, inner.clone())
        .build()
        .unwrap();

    let html = page.render_page(&view_request(None));

    assert!(html.contains(
        "<section class=\"outer\"><section class=\"inner\">\
         <!-- before inner --><!-- before outer -->x<!-- after inner --><!-- after outer -->\
         </section></section>"
    ));
}

#[test]
fn test_hooks_skip_missing_handler() {
    let extension = Arc::new(RecordingExtension::new("outer"));
    let page = demo_builder(test_nonces())
        .extension(0, extension.clone())
        .build()
        .unwrap();

    let html = page.render_page(&view_request(Some("advanced")));

    assert!(!html.contains("<section"));
    assert_eq!(extension.calls(), vec!["alter_config:DemoSettings"]);
}

#[test]
fn test_config_override_applies_once() {
    let extension = Arc::new(
        RecordingExtension::new("rename").with_override(|config| {
            config.page_name = "Overridden".to_string();
            config.default_tab = Some("advanced".to_string());
        }),
    );
    let page = demo_builder(test_nonces())
        .extension(0, extension.clone())
        .build()
        .unwrap();

    assert!(!page.is_finalized());
    assert_eq!(page.active_tab(&view_request(None)), "advanced");
    assert_eq!(page.config().page_name, "Overridden");

    page.render_page(&view_request(None));
    page.render_page(&view_request(Some("general")));

    let alters = extension
        .calls()
        .iter()
        .filter(|c| c.starts_with("alter_config"))
        .count();
    assert_eq!(alters, 1);
}

#[test]
fn test_invalid_override_is_ignored() {
    let extension = Arc::new(
        RecordingExtension::new("breaker").with_override(|config| {
            config.page_name = "Broken".to_string();
            config.tabs = TabSet::new();
        }),
    );
    let page = demo_builder(test_nonces())
        .extension(0, extension)
        .build()
        .unwrap();

    assert_eq!(page.config().page_name, "Demo");
    assert_eq!(page.config().tabs.len(), 2);
}

#[test]
fn test_override_with_unknown_default_tab_is_ignored() {
    let extension = Arc::new(
        RecordingExtension::new("ghost").with_override(|config| {
            config.default_tab = Some("ghost".to_string());
        }),
    );
    let page = demo_builder(test_nonces())
        .extension(0, extension)
        .build()
        .unwrap();

    assert_eq!(page.config().default_tab, None);
    assert_eq!(page.active_tab(&view_request(None)), "general");
}

#[test]
fn test_override_is_visible_to_menu_registration() {
    let host = AdminHost::new(test_nonces());
    let extension = Arc::new(
        RecordingExtension::new("nest").with_override(|config| {
            config.parent_slug = Some("tools".to_string());
            config.show_tabs_in_menu = false;
        }),
    );
    let page = Arc::new(
        demo_builder(host.nonces())
            .extension(0, extension)
            .build()
            .unwrap(),
    );
    host.register_page(&page);

    let menus = host.menus();
    assert!(menus.top_level().is_empty());
    assert_eq!(menus.submenus_of("tools")[0].slug, "demo");
    assert!(menus.links_for("demo").is_empty());
}

#[test]
fn test_add_extension_resets_finalization() {
    let mut page = demo_builder(test_nonces()).build().unwrap();
    assert_eq!(page.config().page_name, "Demo");

    page.add_extension(
        0,
        Arc::new(RecordingExtension::new("late").with_override(|config| {
            config.page_name = "Late".to_string();
        })),
    );

    assert!(!page.is_finalized());
    assert_eq!(page.config().page_name, "Late");
}
