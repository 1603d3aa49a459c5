//! Static navigation catalog: contexts, personas and items

use crate::error::CatalogError;
use crate::item::{NavItem, ALL};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tenant-level grouping that scopes navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationContext {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NavigationContext {
    /// Create context
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: None,
        }
    }
}

/// User-facing role lens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Persona {
    /// Create persona
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }
}

/// Everything the provider filters over
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavCatalog {
    /// Known contexts in display order
    #[serde(default)]
    pub contexts: Vec<NavigationContext>,
    /// Personas in display order; the first is the default
    #[serde(default)]
    pub personas: Vec<Persona>,
    /// Declared items
    #[serde(default)]
    pub items: Vec<NavItem>,
}

impl NavCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add context
    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: NavigationContext) -> Self {
        self.contexts.push(context);
        self
    }

    /// Add persona
    #[inline]
    #[must_use]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.personas.push(persona);
        self
    }

    /// Add item
    #[inline]
    #[must_use]
    pub fn with_item(mut self, item: NavItem) -> Self {
        self.items.push(item);
        self
    }

    /// Look up a context
    #[must_use]
    pub fn context(&self, id: &str) -> Option<&NavigationContext> {
        self.contexts.iter().find(|c| c.id == id)
    }

    /// Look up a persona
    #[must_use]
    pub fn persona(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Known context ids in declaration order
    pub fn context_ids(&self) -> impl Iterator<Item = &str> {
        self.contexts.iter().map(|c| c.id.as_str())
    }

    /// Check ids are unique and items only reference declared contexts
    ///
    /// # Errors
    /// The first inconsistency found
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut contexts = HashSet::new();
        for context in &self.contexts {
            if context.id == ALL {
                return Err(CatalogError::ReservedId(context.id.clone()));
            }
            if !contexts.insert(context.id.as_str()) {
                return Err(CatalogError::DuplicateContext(context.id.clone()));
            }
        }

        let mut personas = HashSet::new();
        for persona in &self.personas {
            if persona.id == ALL {
                return Err(CatalogError::ReservedId(persona.id.clone()));
            }
            if !personas.insert(persona.id.as_str()) {
                return Err(CatalogError::DuplicatePersona(persona.id.clone()));
            }
        }

        for item in self.items.iter().flat_map(NavItem::walk) {
            if let Some(context_id) = &item.context_id {
                if context_id != ALL && !contexts.contains(context_id.as_str()) {
                    return Err(CatalogError::UnknownContext {
                        title: item.title.clone(),
                        context_id: context_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
