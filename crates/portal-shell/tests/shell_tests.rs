//! Shell assembled from config files on disk

use portal_apps::{AppId, AppView, Breadcrumb};
use portal_shell::{PortalShell, ShellConfig, ShellError};
use portal_store::{keys, FileStore, KeyValueStore};
use portal_test_utils::{sample_catalog, sample_table};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;

const CMS_MANIFEST: &str = r#"{
    "appId": "cms",
    "version": "3.1.0",
    "displayName": "Content",
    "description": "Pages and posts",
    "category": "content",
    "entryPoint": "./cms.js",
    "navigation": {
        "position": "sidebar",
        "menuItem": { "title": "Content", "url": "/portal/apps/cms" }
    }
}"#;

const CONFIG: &str = r#"
[storage]
path = "state.json"

[shell]
enforce_navigation_scope = true

[[apps]]
app_id = "cms"
locator = "manifests/cms.json"

[[apps]]
app_id = "broken"
locator = "manifests/broken.json"

[[navigation.contexts]]
id = "cms"
name = "Content"

[[navigation.contexts]]
id = "ops"
name = "Operations"

[[navigation.items]]
title = "Content"
url = "/portal/apps/cms"
contextId = "cms"
appId = "cms"

[[navigation.items]]
title = "Broken"
url = "/portal/apps/broken"
appId = "broken"
"#;

fn write_fixture(dir: &Path) -> std::path::PathBuf {
    std::fs::create_dir_all(dir.join("manifests")).unwrap();
    std::fs::write(dir.join("manifests/cms.json"), CMS_MANIFEST).unwrap();
    std::fs::write(dir.join("manifests/broken.json"), "{ not json").unwrap();
    let config = dir.join("portal.toml");
    std::fs::write(&config, CONFIG).unwrap();
    config
}

#[tokio::test]
async fn opens_manifest_app_with_its_breadcrumbs() {
    let dir = tempfile::tempdir().unwrap();
    let config = ShellConfig::from_file(write_fixture(dir.path())).unwrap();
    let shell = PortalShell::from_config(config).unwrap();

    let view = shell.open("/portal/apps/cms/posts").await.unwrap();
    assert_eq!(
        view.app,
        AppView::App {
            app_id: AppId::from("cms"),
            title: "Content".to_string(),
            body: "Content v3.1.0\nPages and posts".to_string(),
        }
    );
    assert_eq!(
        view.breadcrumbs,
        vec![Breadcrumb::new("Content", "/portal/apps/cms")]
    );
    assert_eq!(view.navigation.len(), 2);
}

#[tokio::test]
async fn active_app_is_restored_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path());

    {
        let shell = PortalShell::from_config(ShellConfig::from_file(&path).unwrap()).unwrap();
        shell.open("/portal/apps/cms").await.unwrap();
    }

    let store = FileStore::open(dir.path().join("state.json")).unwrap();
    assert_eq!(
        store.get(keys::ACTIVE_APP_ID).unwrap().as_deref(),
        Some("cms")
    );

    let shell = PortalShell::from_config(ShellConfig::from_file(&path).unwrap()).unwrap();
    assert!(shell.registry().active_app_id().is_none());
    let view = shell.open("/portal/apps").await.unwrap();
    assert!(matches!(view.app, AppView::App { ref app_id, .. } if app_id.as_str() == "cms"));
    assert_eq!(shell.registry().active_app_id(), Some(AppId::from("cms")));
}

#[tokio::test]
async fn broken_manifest_renders_error_panel() {
    let dir = tempfile::tempdir().unwrap();
    let shell =
        PortalShell::from_config(ShellConfig::from_file(write_fixture(dir.path())).unwrap())
            .unwrap();

    let view = shell.open("/portal/apps/broken").await.unwrap();
    assert_eq!(
        view.app,
        AppView::Error {
            app_id: AppId::from("broken"),
            message: "Failed to load app: broken".to_string(),
        }
    );
    // Path-derived crumbs when no app published any
    assert_eq!(view.breadcrumbs.len(), 3);
    assert!(shell.registry().active_app_id().is_none());
}

#[tokio::test]
async fn navigation_scope_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let shell =
        PortalShell::from_config(ShellConfig::from_file(write_fixture(dir.path())).unwrap())
            .unwrap();

    shell.navigation().set_active_context_id("ops");
    let err = shell.open("/portal/apps/cms").await.unwrap_err();
    assert!(matches!(err, ShellError::NotAddressable(ref id) if id.as_str() == "cms"));

    let err = shell.open("/portal/apps/ghost").await.unwrap_err();
    assert!(err.is_navigation());
}

#[tokio::test]
async fn switching_apps_drops_previous_breadcrumb_override() {
    let mut config = ShellConfig::default();
    config.navigation = sample_catalog();
    let shell = PortalShell::with_parts(
        config,
        Arc::new(sample_table(&["cms", "mixdb"])),
        Arc::new(portal_store::MemoryStore::new()),
    );

    shell.open("/portal/apps/cms").await.unwrap();
    shell
        .bridge()
        .publisher()
        .set([Breadcrumb::new("Drafts", "/portal/apps/cms/drafts")]);
    let again = shell.open("/portal/apps/cms/drafts").await.unwrap();
    assert_eq!(again.breadcrumbs[0].label, "Drafts");

    let other = shell.open("/portal/apps/mixdb").await.unwrap();
    assert_eq!(
        other.breadcrumbs,
        vec![
            Breadcrumb::new("Portal", "/portal"),
            Breadcrumb::new("Apps", "/portal/apps"),
            Breadcrumb::new("Mixdb", "/portal/apps/mixdb"),
        ]
    );
}
