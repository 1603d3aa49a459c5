//! Mini-app descriptors
//!
//! [`MiniAppConfig`] mirrors the JSON manifest every mini-app bundle ships
//! (camelCase keys). It is immutable once a module is loaded.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;

/// Unique mini-app identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    /// Create app id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AppId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AppId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AppId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a mini-app's code bundle lives
///
/// Opaque to the registry; only the [`ModuleLoader`](crate::ModuleLoader)
/// interprets it (a table key, a manifest path, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceLocator(String);

impl SourceLocator {
    /// Create locator
    #[inline]
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SourceLocator {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceLocator {
    fn from(locator: &str) -> Self {
        Self(locator.to_string())
    }
}

impl From<String> for SourceLocator {
    fn from(locator: String) -> Self {
        Self(locator)
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static mini-app descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniAppConfig {
    /// Unique key
    pub app_id: AppId,
    /// Bundle version
    pub version: String,
    /// Human-readable name
    pub display_name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Grouping used by app pickers
    pub category: String,
    /// Icon name
    #[serde(default)]
    pub icon: String,
    /// Entry point reference inside the bundle
    pub entry_point: String,
    /// Sidebar placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationPlacement>,
    /// Permissions the app declares
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionDescriptor>,
    /// Free-form app settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Map<String, Value>>,
    /// Free-form integration settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrations: Option<Map<String, Value>>,
}

impl MiniAppConfig {
    /// Create minimal config
    #[must_use]
    pub fn new(
        app_id: impl Into<AppId>,
        display_name: impl Into<String>,
        category: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            version: "0.1.0".to_string(),
            display_name: display_name.into(),
            description: String::new(),
            category: category.into(),
            icon: String::new(),
            entry_point: entry_point.into(),
            navigation: None,
            permissions: Vec::new(),
            settings: None,
            integrations: None,
        }
    }

    /// Parse and validate a JSON manifest
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed JSON or missing required keys
    /// - `ConfigError::Invalid` for empty identifying fields
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check identifying fields are non-empty
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("appId", self.app_id.as_str()),
            ("displayName", self.display_name.as_str()),
            ("entryPoint", self.entry_point.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if let Some(nav) = &self.navigation {
            if nav.menu_item.url.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "navigation.menuItem.url",
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Set version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Set navigation placement
    #[inline]
    #[must_use]
    pub fn with_navigation(mut self, navigation: NavigationPlacement) -> Self {
        self.navigation = Some(navigation);
        self
    }

    /// Add declared permission
    #[inline]
    #[must_use]
    pub fn with_permission(mut self, permission: PermissionDescriptor) -> Self {
        self.permissions.push(permission);
        self
    }
}

/// Sidebar placement for a mini-app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPlacement {
    /// Region of the shell (e.g. `sidebar`)
    pub position: String,
    /// Lower sorts first
    #[serde(default)]
    pub priority: i32,
    /// Menu entry
    pub menu_item: MenuItem,
}

/// Menu entry contributed by a mini-app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub title: String,
    #[serde(default)]
    pub icon: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

/// Permission declared by a mini-app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDescriptor {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}
