//! Navigation entries

use serde::{Deserialize, Serialize};

/// Sentinel matching every context or persona
pub const ALL: &str = "all";

/// Declarative navigation entry
///
/// Empty id lists mean "not constrained by this facet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub persona_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub role_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permission_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Lower sorts first
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

impl NavItem {
    /// Create globally visible entry
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Scope to a context (or [`ALL`])
    #[inline]
    #[must_use]
    pub fn in_context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Link to a mini-app
    #[inline]
    #[must_use]
    pub fn for_app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Restrict to personas
    #[must_use]
    pub fn for_personas<S: Into<String>>(mut self, personas: impl IntoIterator<Item = S>) -> Self {
        self.persona_ids = personas.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to roles
    #[must_use]
    pub fn for_roles<S: Into<String>>(mut self, roles: impl IntoIterator<Item = S>) -> Self {
        self.role_ids = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to permissions
    #[must_use]
    pub fn for_permissions<S: Into<String>>(
        mut self,
        permissions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.permission_ids = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Owning tenant
    #[inline]
    #[must_use]
    pub fn for_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set icon
    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Add nested entry
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: NavItem) -> Self {
        self.children.push(child);
        self
    }

    /// Visible regardless of context and persona
    #[inline]
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.context_id.is_none() && self.persona_ids.is_empty()
    }

    /// Depth-first walk over this entry and its descendants
    pub fn walk(&self) -> Box<dyn Iterator<Item = &NavItem> + '_> {
        Box::new(std::iter::once(self).chain(self.children.iter().flat_map(NavItem::walk)))
    }
}
