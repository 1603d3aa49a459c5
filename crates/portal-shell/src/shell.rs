//! The portal host shell
//!
//! Wires store, registry, loader, resolver, navigation and breadcrumbs from a
//! [`ShellConfig`] and opens app paths.

use crate::breadcrumbs::BreadcrumbTrail;
use crate::config::ShellConfig;
use crate::error::ShellError;
use parking_lot::Mutex;
use portal_apps::{
    AppId, AppRegistry, AppResolver, AppView, Breadcrumb, BreadcrumbBridge, ManifestLoader,
    ModuleLoader,
};
use portal_nav::{NavItem, NavigationContextProvider};
use portal_store::{FileStore, KeyValueStore, MemoryStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the host draws for one opened path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
    /// Path that was opened
    pub path: String,
    /// App panel
    pub app: AppView,
    /// Published trail, or one derived from the path
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Filtered navigation
    pub navigation: Vec<NavItem>,
}

/// Assembled portal runtime
#[derive(Debug)]
pub struct PortalShell {
    config: ShellConfig,
    registry: Arc<AppRegistry>,
    resolver: AppResolver,
    navigation: NavigationContextProvider,
    bridge: BreadcrumbBridge,
    trail: BreadcrumbTrail,
    opened: Mutex<Option<AppId>>,
}

impl PortalShell {
    /// Build shell with the configured store and manifest loader
    ///
    /// # Errors
    /// `ShellError::Storage` if the storage file cannot be opened
    pub fn from_config(config: ShellConfig) -> Result<Self, ShellError> {
        let store: Arc<dyn KeyValueStore> = match config.storage_path() {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let loader = config.apps.iter().fold(
            ManifestLoader::new(config.manifest_dir()),
            |loader, entry| loader.with_app(entry.app_id.clone(), entry.locator.clone()),
        );
        Ok(Self::with_parts(config, Arc::new(loader), store))
    }

    /// Build shell around an explicit loader and store
    #[must_use]
    pub fn with_parts(
        config: ShellConfig,
        loader: Arc<dyn ModuleLoader>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let registry = Arc::new(AppRegistry::new(loader, store.clone()));
        let bridge = BreadcrumbBridge::new();
        let resolver = AppResolver::new(registry.clone(), bridge.publisher());
        let navigation = NavigationContextProvider::new(config.navigation.clone(), store);
        let trail = BreadcrumbTrail::new(&bridge);
        info!(
            apps = config.apps.len(),
            base = %config.shell.apps_base_path,
            "portal shell ready"
        );
        Self {
            config,
            registry,
            resolver,
            navigation,
            bridge,
            trail,
            opened: Mutex::new(None),
        }
    }

    /// Configuration the shell was built from
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Shared registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<AppRegistry> {
        &self.registry
    }

    /// App resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &AppResolver {
        &self.resolver
    }

    /// Navigation provider
    #[inline]
    #[must_use]
    pub fn navigation(&self) -> &NavigationContextProvider {
        &self.navigation
    }

    /// Breadcrumb bridge mini-apps publish into
    #[inline]
    #[must_use]
    pub fn bridge(&self) -> &BreadcrumbBridge {
        &self.bridge
    }

    /// App id addressed by `path`
    ///
    /// `Ok(None)` for the apps base path itself.
    ///
    /// # Errors
    /// `ShellError::OutsideApps` for paths not under the base path
    pub fn app_id_for(&self, path: &str) -> Result<Option<AppId>, ShellError> {
        let base = self.config.shell.apps_base_path.trim_end_matches('/');
        let path_only = path.split(['?', '#']).next().unwrap_or_default();
        let rest = path_only
            .strip_prefix(base)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| ShellError::OutsideApps(path.to_string()))?;
        Ok(rest
            .split('/')
            .find(|segment| !segment.is_empty())
            .map(AppId::from))
    }

    /// Open an app path and produce the view to draw
    ///
    /// The apps base path alone resolves the restored app, if any.
    ///
    /// # Errors
    /// - `ShellError::OutsideApps` for paths not under the base path
    /// - `ShellError::NotAddressable` when navigation scope is enforced and
    ///   no visible entry links to the app
    pub async fn open(&self, path: &str) -> Result<ShellView, ShellError> {
        let app_id = self.app_id_for(path)?;

        if let Some(app_id) = &app_id {
            if self.config.shell.enforce_navigation_scope
                && !self.navigation.is_app_addressable(app_id.as_str())
            {
                debug!(app_id = %app_id, "refusing app outside navigation scope");
                return Err(ShellError::NotAddressable(app_id.clone()));
            }
        }

        let resolution = self.resolver.resolve(app_id.as_ref().map(AppId::as_str)).await;
        self.switch_breadcrumbs(resolution.app_id());

        Ok(ShellView {
            path: path.to_string(),
            app: self.resolver.render(path),
            breadcrumbs: self.trail.current(path),
            navigation: self.navigation.filtered_nav_items(),
        })
    }

    /// Overrides belong to the app that published them
    fn switch_breadcrumbs(&self, app_id: Option<&AppId>) {
        let mut opened = self.opened.lock();
        if opened.as_ref() != app_id {
            if opened.is_some() {
                self.bridge.publisher().reset();
            }
            *opened = app_id.cloned();
        }
    }
}
