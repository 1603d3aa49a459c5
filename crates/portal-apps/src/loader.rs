//! Module loading
//!
//! Dynamic code loading is expressed as a statically known table: each
//! [`SourceLocator`] maps to a factory returning a boxed future of
//! [`LoadedExports`]. The registry only ever sees the [`ModuleLoader`] trait.

use crate::config::{AppId, MiniAppConfig, SourceLocator};
use crate::error::{AppError, BundleError};
use crate::module::{AppComponent, MiniAppModule, NamedExport};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Raw shape of a loaded bundle, before validation
#[derive(Debug, Clone, Default)]
pub struct LoadedExports {
    /// Renderable default export
    pub default: Option<Arc<dyn AppComponent>>,
    /// Descriptor export
    pub config: Option<MiniAppConfig>,
    /// Everything else the bundle exports
    pub named: HashMap<String, NamedExport>,
}

impl LoadedExports {
    /// Well-formed exports
    #[must_use]
    pub fn new(config: MiniAppConfig, component: Arc<dyn AppComponent>) -> Self {
        Self {
            default: Some(component),
            config: Some(config),
            named: HashMap::new(),
        }
    }

    /// Add named export
    #[must_use]
    pub fn with_export(mut self, name: impl Into<String>, value: NamedExport) -> Self {
        self.named.insert(name.into(), value);
        self
    }
}

/// Validate bundle shape and build the module
///
/// # Errors
/// `AppError::MalformedModule` when the default export or config is missing
pub fn validate_exports(app_id: &AppId, exports: LoadedExports) -> Result<MiniAppModule, AppError> {
    let LoadedExports {
        default,
        config,
        named,
    } = exports;

    let component = default.ok_or_else(|| AppError::MalformedModule {
        app_id: app_id.clone(),
        missing: "default export",
    })?;
    let mut config = config.ok_or_else(|| AppError::MalformedModule {
        app_id: app_id.clone(),
        missing: "config",
    })?;

    // The registry key and the module's reported id must agree
    if &config.app_id != app_id {
        tracing::warn!(
            requested = %app_id,
            declared = %config.app_id,
            "bundle declares a different app id; using the requested one"
        );
        config.app_id = app_id.clone();
    }

    Ok(MiniAppModule::new(config, component).with_exports(named))
}

/// Source of mini-app bundles
#[async_trait]
pub trait ModuleLoader: Send + Sync + fmt::Debug {
    /// Static lookup of the bundle for an app id; `None` means unknown app
    fn locate(&self, app_id: &str) -> Option<SourceLocator>;

    /// Fetch a bundle
    async fn load(&self, locator: &SourceLocator) -> Result<LoadedExports, BundleError>;
}

/// Future returned by a bundle factory
pub type LoaderFuture = BoxFuture<'static, Result<LoadedExports, BundleError>>;

/// Bundle factory stored in a [`LoaderTable`]
pub type LoaderFn = Arc<dyn Fn() -> LoaderFuture + Send + Sync>;

/// Capability-indirection table of bundle factories
#[derive(Clone, Default)]
pub struct LoaderTable {
    bundles: HashMap<SourceLocator, LoaderFn>,
    apps: IndexMap<AppId, SourceLocator>,
}

impl LoaderTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle factory at a locator
    #[must_use]
    pub fn with_bundle<F, Fut>(mut self, locator: impl Into<SourceLocator>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LoadedExports, BundleError>> + Send + 'static,
    {
        self.insert_bundle(locator.into(), factory);
        self
    }

    /// Register a loadable app together with its bundle
    #[must_use]
    pub fn with_app<F, Fut>(
        mut self,
        app_id: impl Into<AppId>,
        locator: impl Into<SourceLocator>,
        factory: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LoadedExports, BundleError>> + Send + 'static,
    {
        let locator = locator.into();
        self.apps.insert(app_id.into(), locator.clone());
        self.insert_bundle(locator, factory);
        self
    }

    /// Point an app id at an already registered locator
    #[inline]
    #[must_use]
    pub fn with_alias(mut self, app_id: impl Into<AppId>, locator: impl Into<SourceLocator>) -> Self {
        self.apps.insert(app_id.into(), locator.into());
        self
    }

    /// Loadable app ids in registration order
    pub fn app_ids(&self) -> impl Iterator<Item = &AppId> {
        self.apps.keys()
    }

    /// Number of registered bundles
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Check if table has no bundles
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    fn insert_bundle<F, Fut>(&mut self, locator: SourceLocator, factory: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LoadedExports, BundleError>> + Send + 'static,
    {
        let factory: LoaderFn = Arc::new(move || factory().boxed());
        self.bundles.insert(locator, factory);
    }
}

impl fmt::Debug for LoaderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderTable")
            .field("bundles", &self.bundles.keys().collect::<Vec<_>>())
            .field("apps", &self.apps)
            .finish()
    }
}

#[async_trait]
impl ModuleLoader for LoaderTable {
    fn locate(&self, app_id: &str) -> Option<SourceLocator> {
        self.apps.get(app_id).cloned()
    }

    async fn load(&self, locator: &SourceLocator) -> Result<LoadedExports, BundleError> {
        let factory = self
            .bundles
            .get(locator)
            .cloned()
            .ok_or_else(|| BundleError::NotFound(locator.clone()))?;
        factory().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MountContext;

    #[derive(Debug)]
    struct Blank;

    impl AppComponent for Blank {
        fn render(&self, _ctx: &MountContext) -> String {
            String::new()
        }
    }

    fn exports(app_id: &str) -> LoadedExports {
        LoadedExports::new(
            MiniAppConfig::new(app_id, app_id, "test", "./index.js"),
            Arc::new(Blank),
        )
    }

    #[test]
    fn validate_requires_default_export() {
        let mut raw = exports("cms");
        raw.default = None;
        let err = validate_exports(&AppId::from("cms"), raw).unwrap_err();
        assert!(matches!(
            err,
            AppError::MalformedModule {
                missing: "default export",
                ..
            }
        ));
    }

    #[test]
    fn validate_requires_config() {
        let mut raw = exports("cms");
        raw.config = None;
        let err = validate_exports(&AppId::from("cms"), raw).unwrap_err();
        assert!(matches!(err, AppError::MalformedModule { missing: "config", .. }));
    }

    #[test]
    fn validate_keeps_named_exports() {
        let raw = exports("cms").with_export("routes", Arc::new(vec!["/", "/pages"]));
        let module = validate_exports(&AppId::from("cms"), raw).unwrap();
        assert_eq!(module.export::<Vec<&'static str>>("routes").map(Vec::len), Some(2));
    }

    #[test]
    fn validate_adopts_requested_id() {
        let module = validate_exports(&AppId::from("cms"), exports("legacy-cms")).unwrap();
        assert_eq!(module.app_id().as_str(), "cms");
        assert_eq!(module.summary().id.as_str(), "cms");
    }

    #[tokio::test]
    async fn table_locates_and_loads() {
        let table = LoaderTable::new()
            .with_app("cms", "bundles/cms", || async { Ok(exports("cms")) })
            .with_alias("content", "bundles/cms");

        assert_eq!(table.locate("content"), Some(SourceLocator::from("bundles/cms")));
        assert!(table.locate("nope").is_none());
        assert_eq!(table.len(), 1);

        let loaded = table.load(&SourceLocator::from("bundles/cms")).await.unwrap();
        assert_eq!(loaded.config.unwrap().app_id.as_str(), "cms");
    }

    #[tokio::test]
    async fn table_missing_bundle_is_not_found() {
        let table = LoaderTable::new();
        let err = table.load(&SourceLocator::from("bundles/x")).await.unwrap_err();
        assert_eq!(err, BundleError::NotFound(SourceLocator::from("bundles/x")));
    }
}
