//! Loaded mini-app modules

use crate::bridge::BreadcrumbPublisher;
use crate::config::{AppId, MiniAppConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Arbitrary named export of a bundle
pub type NamedExport = Arc<dyn Any + Send + Sync>;

/// Renderable default export of a mini-app
pub trait AppComponent: Send + Sync + Debug {
    /// Render the app for the given mount
    fn render(&self, ctx: &MountContext) -> String;
}

/// Capabilities handed to a mounted mini-app
#[derive(Debug, Clone)]
pub struct MountContext {
    /// App being rendered
    pub app_id: AppId,
    /// Shell path the app is mounted under
    pub path: String,
    /// Channel for replacing the host's breadcrumb trail
    pub breadcrumbs: BreadcrumbPublisher,
}

/// A loaded mini-app
///
/// Created by a successful load, owned by the registry until unregistered.
#[derive(Debug, Clone)]
pub struct MiniAppModule {
    config: MiniAppConfig,
    component: Arc<dyn AppComponent>,
    exports: HashMap<String, NamedExport>,
    loaded_at: DateTime<Utc>,
}

impl MiniAppModule {
    /// Create module from config and default export
    #[must_use]
    pub fn new(config: MiniAppConfig, component: Arc<dyn AppComponent>) -> Self {
        Self {
            config,
            component,
            exports: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Attach named exports
    #[inline]
    #[must_use]
    pub fn with_exports(mut self, exports: HashMap<String, NamedExport>) -> Self {
        self.exports = exports;
        self
    }

    /// App id from the config
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> &AppId {
        &self.config.app_id
    }

    /// Static descriptor
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MiniAppConfig {
        &self.config
    }

    /// Default export
    #[inline]
    #[must_use]
    pub fn component(&self) -> &Arc<dyn AppComponent> {
        &self.component
    }

    /// Typed lookup of a named export
    #[must_use]
    pub fn export<T: Any>(&self, name: &str) -> Option<&T> {
        self.exports.get(name).and_then(|e| e.downcast_ref::<T>())
    }

    /// Names of all named exports
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// When the module was registered
    #[inline]
    #[must_use]
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Render the default export
    #[inline]
    #[must_use]
    pub fn render(&self, ctx: &MountContext) -> String {
        self.component.render(ctx)
    }

    /// Summary row for app pickers
    #[must_use]
    pub fn summary(&self) -> AppSummary {
        AppSummary {
            id: self.config.app_id.clone(),
            display_name: self.config.display_name.clone(),
            description: self.config.description.clone(),
            icon: self.config.icon.clone(),
            category: self.config.category.clone(),
        }
    }
}

/// Read-only app listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    /// Registry key
    pub id: AppId,
    /// Human-readable name
    pub display_name: String,
    /// Short description
    pub description: String,
    /// Icon name, empty when unset
    pub icon: String,
    /// Grouping category
    pub category: String,
}
