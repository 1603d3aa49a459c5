//! Navigation context provider
//!
//! Holds the five facets navigation depends on (context, persona, roles,
//! permissions, tenant enablement) and recomputes the filtered item list
//! inside the same transition that changes any of them, so subscribers never
//! observe a selection paired with a stale projection.

use crate::catalog::{NavCatalog, NavigationContext, Persona};
use crate::filter::{FilterInput, NavFilter};
use crate::item::NavItem;
use portal_store::{keys, KeyValueStore, KeyValueStoreExt};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Observable navigation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Selected context
    pub active_context_id: Option<String>,
    /// Selected persona
    pub active_persona_id: Option<String>,
    /// Ordered, de-duplicated
    pub tenant_enabled_contexts: Vec<String>,
    /// Roles held by the current user
    pub user_roles: BTreeSet<String>,
    /// Permissions held by the current user
    pub user_permissions: BTreeSet<String>,
    /// Catalog items visible under the fields above
    pub filtered_nav_items: Vec<NavItem>,
}

impl NavigationState {
    fn input(&self) -> FilterInput<'_> {
        FilterInput {
            active_context_id: self.active_context_id.as_deref(),
            active_persona_id: self.active_persona_id.as_deref(),
            user_roles: &self.user_roles,
            user_permissions: &self.user_permissions,
        }
    }
}

/// Shell-wide navigation selection and filtering
#[derive(Debug)]
pub struct NavigationContextProvider {
    catalog: NavCatalog,
    filter: NavFilter,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<NavigationState>,
}

impl NavigationContextProvider {
    /// Create provider and hydrate selections from `store`
    #[must_use]
    pub fn new(catalog: NavCatalog, store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_filter(catalog, store, NavFilter::standard())
    }

    /// Create provider with a custom filter pipeline
    #[must_use]
    pub fn with_filter(catalog: NavCatalog, store: Arc<dyn KeyValueStore>, filter: NavFilter) -> Self {
        let (state, _rx) = watch::channel(NavigationState::default());
        let provider = Self {
            catalog,
            filter,
            store,
            state,
        };
        provider.hydrate();
        provider
    }

    /// Static catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &NavCatalog {
        &self.catalog
    }

    fn hydrate(&self) {
        let tenant_enabled = match self.store.get_json::<Vec<String>>(keys::TENANT_ENABLED_CONTEXTS) {
            Ok(Some(list)) => dedup(list),
            Ok(None) => self.catalog.context_ids().map(str::to_string).collect(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable tenant context list");
                self.catalog.context_ids().map(str::to_string).collect()
            }
        };

        let persisted_context = self.read(keys::ACTIVE_CONTEXT_ID);
        let persisted_persona = self.read(keys::ACTIVE_PERSONA_ID);

        let available = self.available_ids(&tenant_enabled);
        let context = match persisted_context {
            Some(id) if available.contains(&id.as_str()) => Some(id),
            stale => {
                let fallback = available.first().map(|id| (*id).to_string());
                if stale.is_some() || fallback.is_some() {
                    debug!(stale = ?stale, fallback = ?fallback, "falling back to first available context");
                    self.persist_optional(keys::ACTIVE_CONTEXT_ID, fallback.as_deref());
                }
                fallback
            }
        };

        let persona = match persisted_persona {
            Some(id) if self.catalog.persona(&id).is_some() => Some(id),
            stale => {
                let fallback = self.catalog.personas.first().map(|p| p.id.clone());
                if stale.is_some() || fallback.is_some() {
                    debug!(stale = ?stale, fallback = ?fallback, "falling back to first persona");
                    self.persist_optional(keys::ACTIVE_PERSONA_ID, fallback.as_deref());
                }
                fallback
            }
        };

        info!(context = ?context, persona = ?persona, "navigation state hydrated");
        self.update(|state| {
            state.tenant_enabled_contexts = tenant_enabled;
            state.active_context_id = context;
            state.active_persona_id = persona;
        });
    }

    /// Select a context (any id is accepted)
    pub fn set_active_context_id(&self, context_id: impl Into<String>) {
        let context_id = context_id.into();
        self.persist_optional(keys::ACTIVE_CONTEXT_ID, Some(&context_id));
        debug!(context_id = %context_id, "active context changed");
        self.update(|state| state.active_context_id = Some(context_id));
    }

    /// Select a persona (any id is accepted)
    pub fn set_active_persona_id(&self, persona_id: impl Into<String>) {
        let persona_id = persona_id.into();
        self.persist_optional(keys::ACTIVE_PERSONA_ID, Some(&persona_id));
        debug!(persona_id = %persona_id, "active persona changed");
        self.update(|state| state.active_persona_id = Some(persona_id));
    }

    /// Replace the user's roles
    pub fn set_user_roles<S: Into<String>>(&self, roles: impl IntoIterator<Item = S>) {
        let roles: BTreeSet<String> = roles.into_iter().map(Into::into).collect();
        self.update(|state| state.user_roles = roles);
    }

    /// Replace the user's permissions
    pub fn set_user_permissions<S: Into<String>>(&self, permissions: impl IntoIterator<Item = S>) {
        let permissions: BTreeSet<String> = permissions.into_iter().map(Into::into).collect();
        self.update(|state| state.user_permissions = permissions);
    }

    /// Replace roles and permissions in one transition
    pub fn set_access<R, P>(&self, roles: impl IntoIterator<Item = R>, permissions: impl IntoIterator<Item = P>)
    where
        R: Into<String>,
        P: Into<String>,
    {
        let roles: BTreeSet<String> = roles.into_iter().map(Into::into).collect();
        let permissions: BTreeSet<String> = permissions.into_iter().map(Into::into).collect();
        self.update(|state| {
            state.user_roles = roles;
            state.user_permissions = permissions;
        });
    }

    /// Replace the tenant's enabled contexts
    ///
    /// If the active context is no longer available, the first available one
    /// (in known-context order) is selected and persisted.
    pub fn set_tenant_enabled_contexts<S: Into<String>>(&self, contexts: impl IntoIterator<Item = S>) {
        let enabled = dedup(contexts.into_iter().map(Into::into));
        if let Err(e) = self.store.set_json(keys::TENANT_ENABLED_CONTEXTS, &enabled) {
            warn!(error = %e, "failed to persist tenant contexts");
        }

        let available: Vec<String> = self
            .available_ids(&enabled)
            .into_iter()
            .map(str::to_string)
            .collect();
        let active = self.state.borrow().active_context_id.clone();
        let fallback = match &active {
            Some(id) if available.contains(id) => None,
            _ => Some(available.first().cloned()),
        };

        if let Some(next) = &fallback {
            if next != &active {
                info!(from = ?active, to = ?next, "active context disabled for tenant");
                self.persist_optional(keys::ACTIVE_CONTEXT_ID, next.as_deref());
            }
        }

        self.update(|state| {
            state.tenant_enabled_contexts = enabled;
            if let Some(next) = fallback {
                state.active_context_id = next;
            }
        });
    }

    /// Known contexts the tenant has enabled, in known-context order
    #[must_use]
    pub fn available_contexts(&self) -> Vec<NavigationContext> {
        let state = self.state.borrow();
        self.catalog
            .contexts
            .iter()
            .filter(|c| state.tenant_enabled_contexts.contains(&c.id))
            .cloned()
            .collect()
    }

    /// Active context, if it is a known one
    #[must_use]
    pub fn active_context(&self) -> Option<NavigationContext> {
        let state = self.state.borrow();
        state
            .active_context_id
            .as_deref()
            .and_then(|id| self.catalog.context(id))
            .cloned()
    }

    /// Active persona, if it is a known one
    #[must_use]
    pub fn active_persona(&self) -> Option<Persona> {
        let state = self.state.borrow();
        state
            .active_persona_id
            .as_deref()
            .and_then(|id| self.catalog.persona(id))
            .cloned()
    }

    /// Visible items for the current selection
    #[must_use]
    pub fn filtered_nav_items(&self) -> Vec<NavItem> {
        self.state.borrow().filtered_nav_items.clone()
    }

    /// Check if a visible item (at any depth) links to `app_id`
    #[must_use]
    pub fn is_app_addressable(&self, app_id: &str) -> bool {
        self.state
            .borrow()
            .filtered_nav_items
            .iter()
            .flat_map(NavItem::walk)
            .any(|item| item.app_id.as_deref() == Some(app_id))
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> NavigationState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.state.subscribe()
    }

    fn available_ids<'a>(&'a self, enabled: &[String]) -> Vec<&'a str> {
        self.catalog
            .context_ids()
            .filter(|id| enabled.iter().any(|e| e == id))
            .collect()
    }

    /// Apply `change` and recompute the projection in one transition
    fn update(&self, change: impl FnOnce(&mut NavigationState)) {
        let catalog = &self.catalog;
        let filter = &self.filter;
        self.state.send_if_modified(|state| {
            let before = state.clone();
            change(state);
            state.filtered_nav_items = filter.apply(&catalog.items, &state.input());
            *state != before
        });
    }

    fn read(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "ignoring unreadable navigation selection");
            None
        })
    }

    fn persist_optional(&self, key: &str, value: Option<&str>) {
        if let Err(e) = self.store.set_optional(key, value) {
            warn!(key, error = %e, "failed to persist navigation selection");
        }
    }
}

fn dedup(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn catalog() -> NavCatalog {
        NavCatalog::new()
            .with_context(NavigationContext::new("ctx1", "One"))
            .with_context(NavigationContext::new("ctx2", "Two"))
            .with_context(NavigationContext::new("ctx3", "Three"))
            .with_persona(Persona::new("admin", "Admin"))
            .with_persona(Persona::new("guest", "Guest"))
            .with_item(NavItem::new("A", "/a"))
            .with_item(NavItem::new("B", "/b").in_context("ctx1").for_app("cms"))
            .with_item(
                NavItem::new("C", "/c")
                    .in_context("ctx1")
                    .for_personas(["admin"])
                    .with_child(NavItem::new("C1", "/c/1").for_app("mixdb")),
            )
    }

    fn titles(items: &[NavItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn hydrates_with_fallbacks_and_persists_them() {
        let store = Arc::new(MemoryStore::new());
        let provider = NavigationContextProvider::new(catalog(), store.clone());

        let state = provider.snapshot();
        assert_eq!(state.active_context_id.as_deref(), Some("ctx1"));
        assert_eq!(state.active_persona_id.as_deref(), Some("admin"));
        assert_eq!(state.tenant_enabled_contexts, vec!["ctx1", "ctx2", "ctx3"]);
        assert_eq!(titles(&state.filtered_nav_items), vec!["A", "B", "C"]);
        assert_eq!(store.get(keys::ACTIVE_CONTEXT_ID).unwrap().as_deref(), Some("ctx1"));
        assert_eq!(store.get(keys::ACTIVE_PERSONA_ID).unwrap().as_deref(), Some("admin"));
    }

    #[test]
    fn invalid_persisted_selection_falls_back() {
        let store = Arc::new(MemoryStore::with_entries([
            (keys::TENANT_ENABLED_CONTEXTS, r#"["ctx3","ctx2","ctx2"]"#),
            (keys::ACTIVE_CONTEXT_ID, "ctx1"),
            (keys::ACTIVE_PERSONA_ID, "nobody"),
        ]));
        let provider = NavigationContextProvider::new(catalog(), store.clone());

        let state = provider.snapshot();
        assert_eq!(state.tenant_enabled_contexts, vec!["ctx3", "ctx2"]);
        assert_eq!(state.active_context_id.as_deref(), Some("ctx2"));
        assert_eq!(state.active_persona_id.as_deref(), Some("admin"));
        assert_eq!(store.get(keys::ACTIVE_CONTEXT_ID).unwrap().as_deref(), Some("ctx2"));
    }

    #[test]
    fn available_contexts_follow_catalog_order() {
        let store = Arc::new(MemoryStore::with_entries([(
            keys::TENANT_ENABLED_CONTEXTS,
            r#"["ctx3","ghost","ctx1"]"#,
        )]));
        let provider = NavigationContextProvider::new(catalog(), store);
        let ids: Vec<String> = provider.available_contexts().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["ctx1", "ctx3"]);
    }

    #[test]
    fn persona_change_recomputes() {
        let provider = NavigationContextProvider::new(catalog(), Arc::new(MemoryStore::new()));
        provider.set_active_persona_id("guest");
        assert_eq!(titles(&provider.filtered_nav_items()), vec!["A", "B"]);
        assert_eq!(provider.active_persona().map(|p| p.name), Some("Guest".to_string()));
    }

    #[test]
    fn addressability_includes_children() {
        let provider = NavigationContextProvider::new(catalog(), Arc::new(MemoryStore::new()));
        assert!(provider.is_app_addressable("cms"));
        assert!(provider.is_app_addressable("mixdb"));

        provider.set_active_persona_id("guest");
        assert!(!provider.is_app_addressable("mixdb"));

        provider.set_active_context_id("ctx2");
        assert!(!provider.is_app_addressable("cms"));
        assert!(provider.active_context().is_some());
    }

    #[test]
    fn unknown_context_is_accepted_but_not_exposed() {
        let provider = NavigationContextProvider::new(catalog(), Arc::new(MemoryStore::new()));
        provider.set_active_context_id("elsewhere");
        assert_eq!(provider.snapshot().active_context_id.as_deref(), Some("elsewhere"));
        assert!(provider.active_context().is_none());
        assert_eq!(titles(&provider.filtered_nav_items()), vec!["A"]);
    }

    #[test]
    fn access_change_is_one_notification() {
        let provider = NavigationContextProvider::new(catalog(), Arc::new(MemoryStore::new()));
        let mut rx = provider.subscribe();
        rx.borrow_and_update();

        provider.set_access(["editor"], ["pages.write"]);
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert!(state.user_roles.contains("editor"));
        assert!(state.user_permissions.contains("pages.write"));

        // Same values again: nothing to notify
        provider.set_user_roles(["editor"]);
        assert!(!rx.has_changed().unwrap());
    }
}
