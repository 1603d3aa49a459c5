//! Testing utilities for the portal workspace
//!
//! Shared fixtures: sample configs and modules, ready and gated bundles, and
//! a small navigation catalog.

#![allow(missing_docs)]

use futures::FutureExt;
use parking_lot::Mutex;
use portal_apps::loader::LoaderFuture;
use portal_apps::{
    AppComponent, LoadedExports, LoaderTable, MenuItem, MiniAppConfig, MiniAppModule,
    MountContext, NavigationPlacement,
};
use portal_nav::{NavCatalog, NavItem, NavigationContext, Persona};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Component rendering its title and mount path
#[derive(Debug, Clone)]
pub struct StaticPage {
    pub title: String,
}

impl StaticPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl AppComponent for StaticPage {
    fn render(&self, ctx: &MountContext) -> String {
        format!("{} @ {}", self.title, ctx.path)
    }
}

pub fn sample_config(app_id: &str) -> MiniAppConfig {
    MiniAppConfig::new(app_id, title_of(app_id), "test", "./index.js")
        .with_version("1.0.0")
        .with_navigation(NavigationPlacement {
            position: "sidebar".to_string(),
            priority: 0,
            menu_item: MenuItem {
                title: title_of(app_id),
                icon: String::new(),
                url: format!("/portal/apps/{app_id}"),
                badge: None,
                context_id: None,
            },
        })
}

pub fn sample_module(app_id: &str) -> MiniAppModule {
    MiniAppModule::new(sample_config(app_id), Arc::new(StaticPage::new(title_of(app_id))))
}

pub fn ready_exports(app_id: &str) -> LoadedExports {
    LoadedExports::new(sample_config(app_id), Arc::new(StaticPage::new(title_of(app_id))))
}

pub fn locator_of(app_id: &str) -> String {
    format!("bundles/{app_id}")
}

/// Table with an immediately ready bundle per id at `bundles/<id>`
pub fn sample_table(app_ids: &[&str]) -> LoaderTable {
    app_ids.iter().fold(LoaderTable::new(), |table, id| {
        let exports = ready_exports(id);
        table.with_app(*id, locator_of(id), move || {
            let exports = exports.clone();
            async move { Ok(exports) }
        })
    })
}

/// Releases one gated load
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// Bundle factory whose n-th invocation waits for the n-th gate
///
/// Invocations past the number of gates resolve immediately.
pub fn gated_bundle(
    exports: LoadedExports,
    gates: usize,
) -> (Vec<Gate>, impl Fn() -> LoaderFuture + Send + Sync + 'static) {
    let (senders, receivers): (Vec<_>, VecDeque<_>) = (0..gates)
        .map(|_| {
            let (tx, rx) = oneshot::channel::<()>();
            (Gate(tx), rx)
        })
        .unzip();
    let receivers = Arc::new(Mutex::new(receivers));

    let factory = move || {
        let gate = receivers.lock().pop_front();
        let exports = exports.clone();
        async move {
            if let Some(rx) = gate {
                // A dropped gate counts as opened
                let _ = rx.await;
            }
            Ok(exports)
        }
        .boxed()
    };
    (senders, factory)
}

/// Catalog with two contexts, two personas and app-linked items
pub fn sample_catalog() -> NavCatalog {
    NavCatalog::new()
        .with_context(NavigationContext::new("cms", "Content"))
        .with_context(NavigationContext::new("mixdb", "Data"))
        .with_persona(Persona::new("admin", "Administrator"))
        .with_persona(Persona::new("editor", "Editor"))
        .with_item(NavItem::new("Dashboard", "/portal").with_priority(-10))
        .with_item(
            NavItem::new("Pages", "/portal/apps/cms")
                .in_context("cms")
                .for_app("cms")
                .with_priority(1),
        )
        .with_item(
            NavItem::new("Settings", "/portal/settings")
                .in_context("cms")
                .for_personas(["admin"])
                .with_priority(5),
        )
        .with_item(
            NavItem::new("Databases", "/portal/apps/mixdb")
                .in_context("mixdb")
                .for_app("mixdb"),
        )
        .with_item(NavItem::new("Help", "/portal/help").in_context("all").with_priority(100))
}

fn title_of(app_id: &str) -> String {
    let mut chars = app_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
