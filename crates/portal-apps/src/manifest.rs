//! Manifest-only bundles
//!
//! Loads a [`MiniAppConfig`] JSON manifest from disk and serves it through a
//! [`ManifestPage`]. Used by the shell for apps whose UI lives elsewhere and
//! only need a landing page inside the portal.

use crate::bridge::Breadcrumb;
use crate::config::{AppId, MiniAppConfig, SourceLocator};
use crate::error::BundleError;
use crate::loader::{LoadedExports, ModuleLoader};
use crate::module::{AppComponent, MountContext};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loader reading manifests relative to a base directory
#[derive(Debug, Clone, Default)]
pub struct ManifestLoader {
    base_dir: PathBuf,
    apps: IndexMap<AppId, SourceLocator>,
}

impl ManifestLoader {
    /// Create loader rooted at `base_dir`
    #[inline]
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            apps: IndexMap::new(),
        }
    }

    /// Register an app whose manifest lives at `locator`
    #[inline]
    #[must_use]
    pub fn with_app(mut self, app_id: impl Into<AppId>, locator: impl Into<SourceLocator>) -> Self {
        self.apps.insert(app_id.into(), locator.into());
        self
    }

    /// Loadable app ids in registration order
    pub fn app_ids(&self) -> impl Iterator<Item = &AppId> {
        self.apps.keys()
    }

    /// Manifest path for a locator
    #[must_use]
    pub fn resolve_path(&self, locator: &SourceLocator) -> PathBuf {
        let path = Path::new(locator.as_str());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[async_trait]
impl ModuleLoader for ManifestLoader {
    fn locate(&self, app_id: &str) -> Option<SourceLocator> {
        self.apps.get(app_id).cloned()
    }

    async fn load(&self, locator: &SourceLocator) -> Result<LoadedExports, BundleError> {
        let path = self.resolve_path(locator);
        tracing::debug!(path = %path.display(), "reading app manifest");

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BundleError::Io {
                locator: locator.clone(),
                message: e.to_string(),
            })?;

        let config = MiniAppConfig::from_json(&raw).map_err(|e| BundleError::Decode {
            locator: locator.clone(),
            message: e.to_string(),
        })?;

        let page = ManifestPage::new(&config);
        Ok(LoadedExports::new(config, Arc::new(page)))
    }
}

/// Landing page rendered from a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPage {
    title: String,
    version: String,
    description: String,
    home: Option<String>,
}

impl ManifestPage {
    /// Build page from a manifest
    #[must_use]
    pub fn new(config: &MiniAppConfig) -> Self {
        Self {
            title: config.display_name.clone(),
            version: config.version.clone(),
            description: config.description.clone(),
            home: config
                .navigation
                .as_ref()
                .map(|nav| nav.menu_item.url.clone()),
        }
    }
}

impl AppComponent for ManifestPage {
    fn render(&self, ctx: &MountContext) -> String {
        let home = self.home.clone().unwrap_or_else(|| ctx.path.clone());
        ctx.breadcrumbs.set([Breadcrumb::new(self.title.clone(), home)]);

        let mut out = format!("{} v{}", self.title, self.version);
        if !self.description.is_empty() {
            out.push('\n');
            out.push_str(&self.description);
        }
        out
    }
}
