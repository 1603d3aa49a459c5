//! Mini-app registry
//!
//! Process-wide catalog of loaded mini-apps with a single active selection.
//! State lives in a `watch` channel: [`AppRegistry::snapshot`] reads it,
//! [`AppRegistry::subscribe`] observes every change.
//!
//! # Invariants
//! - `active_app_id`, when set, is always a key of `apps`
//! - a load commits only if it still holds the latest generation token for
//!   its app id; anything older is discarded on arrival
//! - no lock is held across an await

use crate::config::{AppId, SourceLocator};
use crate::error::AppError;
use crate::loader::{validate_exports, ModuleLoader};
use crate::module::{AppSummary, MiniAppModule};
use indexmap::IndexMap;
use parking_lot::Mutex;
use portal_store::{keys, KeyValueStore, KeyValueStoreExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Observable registry state
#[derive(Debug, Clone, Default)]
pub struct RegistryState {
    /// Loaded apps in registration order
    pub apps: IndexMap<AppId, Arc<MiniAppModule>>,
    /// Current selection
    pub active_app_id: Option<AppId>,
    /// True while any load is in flight
    pub loading: bool,
    /// Last load failure, cleared when a new load starts
    pub error: Option<AppError>,
    /// Latest generation token per app with a load in flight
    in_flight: HashMap<AppId, u64>,
}

impl RegistryState {
    /// Module of the active app
    #[inline]
    #[must_use]
    pub fn active_app(&self) -> Option<&Arc<MiniAppModule>> {
        self.active_app_id
            .as_ref()
            .and_then(|id| self.apps.get(id))
    }

    /// Listing for app pickers
    #[must_use]
    pub fn app_list(&self) -> Vec<AppSummary> {
        self.apps.values().map(|m| m.summary()).collect()
    }

    /// Check if a load of `app_id` is in flight
    #[inline]
    #[must_use]
    pub fn is_loading(&self, app_id: &str) -> bool {
        self.in_flight.contains_key(app_id)
    }
}

/// The mini-app registry
#[derive(Debug)]
pub struct AppRegistry {
    state: watch::Sender<RegistryState>,
    generation: AtomicU64,
    restored_app_id: Mutex<Option<AppId>>,
    loader: Arc<dyn ModuleLoader>,
    store: Arc<dyn KeyValueStore>,
}

impl AppRegistry {
    /// Create registry, reading the persisted active id as a restore hint
    ///
    /// The restored id is not loaded here; [`AppResolver`](crate::AppResolver)
    /// loads it when asked to resolve without an explicit id.
    #[must_use]
    pub fn new(loader: Arc<dyn ModuleLoader>, store: Arc<dyn KeyValueStore>) -> Self {
        let restored = match store.get(keys::ACTIVE_APP_ID) {
            Ok(id) => id.filter(|id| !id.is_empty()).map(AppId::from),
            Err(e) => {
                warn!(error = %e, "cannot read persisted active app id");
                None
            }
        };
        if let Some(id) = &restored {
            debug!(app_id = %id, "restored active app hint");
        }

        let (state, _rx) = watch::channel(RegistryState::default());
        Self {
            state,
            generation: AtomicU64::new(0),
            restored_app_id: Mutex::new(restored),
            loader,
            store,
        }
    }

    /// Loader used for cache misses
    #[inline]
    #[must_use]
    pub fn loader(&self) -> &Arc<dyn ModuleLoader> {
        &self.loader
    }

    /// Persisted active id not yet re-activated
    #[inline]
    #[must_use]
    pub fn restored_app_id(&self) -> Option<AppId> {
        self.restored_app_id.lock().clone()
    }

    /// Upsert a module under its config's app id
    ///
    /// Last write wins; never changes the active app.
    pub fn register_app(&self, module: MiniAppModule) {
        let app_id = module.app_id().clone();
        let module = Arc::new(module);
        self.state.send_modify(|state| {
            state.apps.insert(app_id.clone(), module);
        });
        debug!(app_id = %app_id, "registered app");
    }

    /// Upsert many modules with a single notification
    pub fn register_apps(&self, modules: impl IntoIterator<Item = MiniAppModule>) {
        let modules: Vec<_> = modules
            .into_iter()
            .map(|m| (m.app_id().clone(), Arc::new(m)))
            .collect();
        let count = modules.len();
        self.state.send_modify(|state| {
            state.apps.extend(modules);
        });
        debug!(count, "registered apps");
    }

    /// Remove an app; clears the active selection if it pointed there
    pub fn unregister_app(&self, app_id: &str) -> Option<Arc<MiniAppModule>> {
        let mut removed = None;
        self.state.send_if_modified(|state| {
            removed = state.apps.shift_remove(app_id);
            if removed.is_none() {
                return false;
            }
            if state.active_app_id.as_ref().is_some_and(|id| id.as_str() == app_id) {
                self.persist_active(None);
                state.active_app_id = None;
            }
            true
        });
        if removed.is_some() {
            debug!(app_id, "unregistered app");
        }
        removed
    }

    /// Select the active app
    ///
    /// Accepts `None` or an id already present in the registry. Unknown ids
    /// leave state untouched and return `false`; callers load first.
    pub fn set_active_app(&self, app_id: Option<&str>) -> bool {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            let next = match app_id {
                None => None,
                Some(id) => match state.apps.get_key_value(id) {
                    Some((key, _)) => Some(key.clone()),
                    None => return false,
                },
            };
            accepted = true;
            if state.active_app_id == next {
                return false;
            }
            self.persist_active(next.as_ref());
            state.active_app_id = next;
            true
        });

        if accepted {
            *self.restored_app_id.lock() = None;
            debug!(app_id = ?app_id, "active app set");
        } else {
            debug!(app_id = ?app_id, "ignoring activation of unregistered app");
        }
        accepted
    }

    /// Load an app bundle and register it under `app_id`
    ///
    /// # Errors
    /// - `AppError::ModuleFetch` if the loader fails
    /// - `AppError::MalformedModule` if the bundle lacks a default export or config
    /// - `AppError::Superseded` if a newer load of the same app started meanwhile
    ///   (state is left to the newer load)
    pub async fn load_app(
        &self,
        app_id: impl Into<AppId>,
        locator: &SourceLocator,
    ) -> Result<Arc<MiniAppModule>, AppError> {
        let app_id = app_id.into();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.state.send_modify(|state| {
            state.in_flight.insert(app_id.clone(), generation);
            state.loading = true;
            state.error = None;
        });
        info!(app_id = %app_id, locator = %locator, generation, "loading app");

        let outcome = match self.loader.load(locator).await {
            Ok(exports) => validate_exports(&app_id, exports).map(Arc::new),
            Err(source) => Err(AppError::ModuleFetch {
                app_id: app_id.clone(),
                source,
            }),
        };

        self.complete_load(app_id, generation, outcome)
    }

    fn complete_load(
        &self,
        app_id: AppId,
        generation: u64,
        outcome: Result<Arc<MiniAppModule>, AppError>,
    ) -> Result<Arc<MiniAppModule>, AppError> {
        let mut committed = false;
        self.state.send_if_modified(|state| {
            if state.in_flight.get(&app_id) != Some(&generation) {
                return false;
            }
            state.in_flight.remove(&app_id);
            state.loading = !state.in_flight.is_empty();
            match &outcome {
                Ok(module) => {
                    state.apps.insert(app_id.clone(), module.clone());
                }
                Err(e) => state.error = Some(e.clone()),
            }
            committed = true;
            true
        });

        if !committed {
            warn!(app_id = %app_id, generation, "discarding stale load result");
            metrics::counter!("portal_app_loads_total", "outcome" => "superseded").increment(1);
            return Err(AppError::Superseded(app_id));
        }

        match &outcome {
            Ok(_) => {
                info!(app_id = %app_id, generation, "app loaded");
                metrics::counter!("portal_app_loads_total", "outcome" => "loaded").increment(1);
            }
            Err(e) if e.is_defect() => {
                error!(target: "portal_apps::malformed", app_id = %app_id, error = %e, "mini-app bundle is malformed");
                metrics::counter!("portal_app_loads_total", "outcome" => "malformed").increment(1);
            }
            Err(e) => {
                warn!(app_id = %app_id, error = %e, "app load failed");
                metrics::counter!("portal_app_loads_total", "outcome" => "failed").increment(1);
            }
        }
        outcome
    }

    /// Wait until no load of `app_id` is in flight, then read it
    pub async fn settle(&self, app_id: &str) -> Option<Arc<MiniAppModule>> {
        let mut rx = self.state.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                if !state.is_loading(app_id) {
                    return state.apps.get(app_id).cloned();
                }
            }
            if rx.changed().await.is_err() {
                return self.get_app(app_id);
            }
        }
    }

    /// Snapshot read of one app
    #[inline]
    #[must_use]
    pub fn get_app(&self, app_id: &str) -> Option<Arc<MiniAppModule>> {
        self.state.borrow().apps.get(app_id).cloned()
    }

    /// Check if an app is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, app_id: &str) -> bool {
        self.state.borrow().apps.contains_key(app_id)
    }

    /// Module of the active app
    #[inline]
    #[must_use]
    pub fn active_app(&self) -> Option<Arc<MiniAppModule>> {
        self.state.borrow().active_app().cloned()
    }

    /// Active app id
    #[inline]
    #[must_use]
    pub fn active_app_id(&self) -> Option<AppId> {
        self.state.borrow().active_app_id.clone()
    }

    /// Listing for app pickers
    #[inline]
    #[must_use]
    pub fn app_list(&self) -> Vec<AppSummary> {
        self.state.borrow().app_list()
    }

    /// True while any load is in flight
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Last load failure
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<AppError> {
        self.state.borrow().error.clone()
    }

    /// Full state copy
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> RegistryState {
        self.state.borrow().clone()
    }

    /// Observe state changes
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RegistryState> {
        self.state.subscribe()
    }

    /// Drop every app, pending load and the persisted active id
    pub fn reset(&self) {
        if let Err(e) = self.store.remove(keys::ACTIVE_APP_ID) {
            warn!(error = %e, "cannot clear persisted active app id");
        }
        *self.restored_app_id.lock() = None;
        self.state.send_replace(RegistryState::default());
        info!("registry reset");
    }

    fn persist_active(&self, app_id: Option<&AppId>) {
        if let Err(e) = self
            .store
            .set_optional(keys::ACTIVE_APP_ID, app_id.map(AppId::as_str))
        {
            warn!(error = %e, "cannot persist active app id");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MiniAppConfig;
    use crate::loader::{LoadedExports, LoaderTable};
    use crate::module::{AppComponent, MountContext};
    use crate::error::BundleError;
    use portal_store::MemoryStore;

    #[derive(Debug)]
    struct Page(&'static str);

    impl AppComponent for Page {
        fn render(&self, _ctx: &MountContext) -> String {
            self.0.to_string()
        }
    }

    fn module(app_id: &str) -> MiniAppModule {
        MiniAppModule::new(
            MiniAppConfig::new(app_id, app_id.to_uppercase(), "test", "./index.js"),
            Arc::new(Page("page")),
        )
    }

    fn registry_with(loader: LoaderTable, store: Arc<MemoryStore>) -> AppRegistry {
        AppRegistry::new(Arc::new(loader), store)
    }

    fn empty_registry() -> (AppRegistry, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (registry_with(LoaderTable::new(), store.clone()), store)
    }

    #[test]
    fn register_is_upsert_without_activation() {
        let (registry, _) = empty_registry();
        registry.register_app(module("cms"));
        registry.register_app(module("cms"));
        registry.register_apps([module("mix-db"), module("workflow")]);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.apps.len(), 3);
        assert!(snapshot.active_app_id.is_none());
        let ids: Vec<_> = registry.app_list().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![AppId::from("cms"), AppId::from("mix-db"), AppId::from("workflow")]);
    }

    #[test]
    fn set_active_persists_and_unknown_is_noop() {
        let (registry, store) = empty_registry();
        registry.register_app(module("cms"));

        assert!(registry.set_active_app(Some("cms")));
        assert_eq!(store.get(keys::ACTIVE_APP_ID).unwrap().as_deref(), Some("cms"));

        assert!(!registry.set_active_app(Some("ghost")));
        assert_eq!(registry.active_app_id(), Some(AppId::from("cms")));
        assert_eq!(store.get(keys::ACTIVE_APP_ID).unwrap().as_deref(), Some("cms"));

        assert!(registry.set_active_app(None));
        assert!(registry.active_app_id().is_none());
        assert!(store.get(keys::ACTIVE_APP_ID).unwrap().is_none());
    }

    #[test]
    fn unregister_active_clears_selection() {
        let (registry, store) = empty_registry();
        registry.register_apps([module("cms"), module("mix-db")]);
        registry.set_active_app(Some("cms"));

        assert!(registry.unregister_app("mix-db").is_some());
        assert_eq!(registry.active_app_id(), Some(AppId::from("cms")));

        assert!(registry.unregister_app("cms").is_some());
        assert!(registry.active_app_id().is_none());
        assert!(store.get(keys::ACTIVE_APP_ID).unwrap().is_none());
        assert!(registry.unregister_app("cms").is_none());
    }

    #[test]
    fn construction_restores_hint_without_activating() {
        let store = Arc::new(MemoryStore::with_entries([(keys::ACTIVE_APP_ID, "cms")]));
        let registry = registry_with(LoaderTable::new(), store);

        assert_eq!(registry.restored_app_id(), Some(AppId::from("cms")));
        assert!(registry.active_app_id().is_none());

        registry.register_app(module("cms"));
        registry.set_active_app(Some("cms"));
        assert!(registry.restored_app_id().is_none());
    }

    #[tokio::test]
    async fn load_registers_module() {
        let store = Arc::new(MemoryStore::new());
        let loader = LoaderTable::new().with_bundle("bundles/cms", || async {
            Ok(LoadedExports::new(
                MiniAppConfig::new("cms", "CMS", "content", "./index.js"),
                Arc::new(Page("cms")),
            ))
        });
        let registry = registry_with(loader, store);

        let loaded = registry
            .load_app("cms", &SourceLocator::from("bundles/cms"))
            .await
            .unwrap();
        assert_eq!(loaded.config().display_name, "CMS");
        assert!(registry.contains("cms"));
        assert!(!registry.is_loading());
        assert!(registry.last_error().is_none());
    }

    #[tokio::test]
    async fn failed_load_stores_and_returns_error() {
        let store = Arc::new(MemoryStore::new());
        let loader = LoaderTable::new().with_bundle("bundles/cms", || async {
            Err(BundleError::Failed("offline".to_string()))
        });
        let registry = registry_with(loader, store);

        let err = registry
            .load_app("cms", &SourceLocator::from("bundles/cms"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ModuleFetch { .. }));
        assert_eq!(registry.last_error(), Some(err));
        assert!(!registry.is_loading());
        assert!(!registry.contains("cms"));
    }

    #[tokio::test]
    async fn malformed_bundle_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let loader = LoaderTable::new().with_bundle("bundles/cms", || async {
            Ok(LoadedExports::default())
        });
        let registry = registry_with(loader, store);

        let err = registry
            .load_app("cms", &SourceLocator::from("bundles/cms"))
            .await
            .unwrap_err();
        assert!(err.is_defect());
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let (registry, _) = empty_registry();
        let mut rx = registry.subscribe();

        registry.register_app(module("cms"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().apps.len(), 1);

        registry.set_active_app(Some("ghost"));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn reset_clears_everything() {
        let (registry, store) = empty_registry();
        registry.register_app(module("cms"));
        registry.set_active_app(Some("cms"));

        registry.reset();
        assert!(registry.snapshot().apps.is_empty());
        assert!(registry.active_app_id().is_none());
        assert!(store.get(keys::ACTIVE_APP_ID).unwrap().is_none());
    }
}
