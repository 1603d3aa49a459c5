//! Navigation filter pipeline
//!
//! Visibility is an ordered list of predicates folded over each item; an
//! item survives only if every stage admits it. The standard stages are
//! scope (context), persona, role and permission. Survivors are stably
//! sorted by ascending priority, children included.

use crate::item::{NavItem, ALL};
use std::collections::BTreeSet;
use std::fmt;

/// Inputs the pipeline filters against
#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub active_context_id: Option<&'a str>,
    pub active_persona_id: Option<&'a str>,
    pub user_roles: &'a BTreeSet<String>,
    pub user_permissions: &'a BTreeSet<String>,
}

/// One pipeline stage
pub type NavPredicate = fn(&NavItem, &FilterInput<'_>) -> bool;

/// Globally visible, or scoped to the active context or to every context
#[must_use]
pub fn in_scope(item: &NavItem, input: &FilterInput<'_>) -> bool {
    if item.is_global() {
        return true;
    }
    match item.context_id.as_deref() {
        Some(ALL) => true,
        Some(context_id) => input.active_context_id == Some(context_id),
        None => false,
    }
}

/// Items with personas must list the active one or the sentinel
#[must_use]
pub fn persona_matches(item: &NavItem, input: &FilterInput<'_>) -> bool {
    item.persona_ids.is_empty()
        || item
            .persona_ids
            .iter()
            .any(|p| p == ALL || input.active_persona_id == Some(p.as_str()))
}

/// Items with roles must share one with the user
#[must_use]
pub fn role_matches(item: &NavItem, input: &FilterInput<'_>) -> bool {
    item.role_ids.is_empty() || item.role_ids.iter().any(|r| input.user_roles.contains(r))
}

/// Items with permissions must share one with the user
#[must_use]
pub fn permission_matches(item: &NavItem, input: &FilterInput<'_>) -> bool {
    item.permission_ids.is_empty()
        || item
            .permission_ids
            .iter()
            .any(|p| input.user_permissions.contains(p))
}

/// Ordered predicate pipeline
#[derive(Clone)]
pub struct NavFilter {
    stages: Vec<(&'static str, NavPredicate)>,
}

impl NavFilter {
    /// Scope, persona, role, permission
    #[must_use]
    pub fn standard() -> Self {
        Self {
            stages: vec![
                ("scope", in_scope as NavPredicate),
                ("persona", persona_matches),
                ("role", role_matches),
                ("permission", permission_matches),
            ],
        }
    }

    /// Append a stage
    #[inline]
    #[must_use]
    pub fn with_stage(mut self, name: &'static str, predicate: NavPredicate) -> Self {
        self.stages.push((name, predicate));
        self
    }

    /// Stage names in order
    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|(name, _)| *name)
    }

    /// Check a single item against every stage
    #[must_use]
    pub fn admits(&self, item: &NavItem, input: &FilterInput<'_>) -> bool {
        self.stages
            .iter()
            .fold(true, |keep, (_, predicate)| keep && predicate(item, input))
    }

    /// Filtered, priority-ordered projection of `items`
    #[must_use]
    pub fn apply(&self, items: &[NavItem], input: &FilterInput<'_>) -> Vec<NavItem> {
        let mut visible: Vec<NavItem> = items
            .iter()
            .filter(|item| self.admits(item, input))
            .map(|item| NavItem {
                children: self.apply(&item.children, input),
                ..item.clone()
            })
            .collect();
        // Stable: equal priorities keep declaration order
        visible.sort_by_key(|item| item.priority);
        visible
    }
}

impl Default for NavFilter {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for NavFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavFilter")
            .field("stages", &self.stage_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(items: &[NavItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    fn input<'a>(
        context: Option<&'a str>,
        persona: Option<&'a str>,
        roles: &'a BTreeSet<String>,
        permissions: &'a BTreeSet<String>,
    ) -> FilterInput<'a> {
        FilterInput {
            active_context_id: context,
            active_persona_id: persona,
            user_roles: roles,
            user_permissions: permissions,
        }
    }

    fn abc() -> Vec<NavItem> {
        vec![
            NavItem::new("A", "/a"),
            NavItem::new("B", "/b").in_context("ctx1"),
            NavItem::new("C", "/c").in_context("ctx1").for_personas(["admin"]),
        ]
    }

    #[test]
    fn persona_narrows_context_items() {
        let none = BTreeSet::new();
        let filter = NavFilter::standard();

        let admin = filter.apply(&abc(), &input(Some("ctx1"), Some("admin"), &none, &none));
        assert_eq!(titles(&admin), vec!["A", "B", "C"]);

        let guest = filter.apply(&abc(), &input(Some("ctx1"), Some("guest"), &none, &none));
        assert_eq!(titles(&guest), vec!["A", "B"]);

        let other = filter.apply(&abc(), &input(Some("ctx2"), Some("admin"), &none, &none));
        assert_eq!(titles(&other), vec!["A"]);
    }

    #[test]
    fn sentinels_match_everything() {
        let none = BTreeSet::new();
        let items = vec![
            NavItem::new("Help", "/help").in_context(ALL),
            NavItem::new("News", "/news").in_context("ctx1").for_personas([ALL]),
        ];
        let visible = NavFilter::standard().apply(&items, &input(Some("ctx1"), None, &none, &none));
        assert_eq!(titles(&visible), vec!["Help", "News"]);
    }

    #[test]
    fn persona_only_items_are_not_global() {
        let none = BTreeSet::new();
        let items = vec![NavItem::new("Drafts", "/drafts").for_personas(["editor"])];
        let visible =
            NavFilter::standard().apply(&items, &input(Some("ctx1"), Some("editor"), &none, &none));
        assert!(visible.is_empty());
    }

    #[test]
    fn roles_and_permissions_require_overlap() {
        let roles: BTreeSet<String> = ["editor".to_string()].into();
        let permissions: BTreeSet<String> = ["pages.write".to_string()].into();
        let items = vec![
            NavItem::new("Edit", "/edit").for_roles(["editor", "admin"]),
            NavItem::new("Admin", "/admin").for_roles(["admin"]),
            NavItem::new("Write", "/write").for_permissions(["pages.write"]),
            NavItem::new("Delete", "/delete").for_permissions(["pages.delete"]),
        ];
        let visible =
            NavFilter::standard().apply(&items, &input(None, None, &roles, &permissions));
        assert_eq!(titles(&visible), vec!["Edit", "Write"]);
    }

    #[test]
    fn sorts_by_priority_with_stable_ties() {
        let none = BTreeSet::new();
        let items = vec![
            NavItem::new("five", "/5").with_priority(5),
            NavItem::new("one", "/1").with_priority(1),
            NavItem::new("three", "/3").with_priority(3),
            NavItem::new("one-again", "/1b").with_priority(1),
        ];
        let visible = NavFilter::standard().apply(&items, &input(None, None, &none, &none));
        assert_eq!(titles(&visible), vec!["one", "one-again", "three", "five"]);
    }

    #[test]
    fn children_are_filtered_and_sorted() {
        let none = BTreeSet::new();
        let items = vec![NavItem::new("Root", "/")
            .with_child(NavItem::new("late", "/late").with_priority(9))
            .with_child(NavItem::new("hidden", "/hidden").in_context("ctx2"))
            .with_child(NavItem::new("early", "/early").with_priority(-1))];
        let visible = NavFilter::standard().apply(&items, &input(Some("ctx1"), None, &none, &none));
        assert_eq!(titles(&visible[0].children), vec!["early", "late"]);
    }

    #[test]
    fn custom_stage_extends_pipeline() {
        fn tenant_acme(item: &NavItem, _input: &FilterInput<'_>) -> bool {
            item.tenant_id.as_deref().map_or(true, |t| t == "acme")
        }

        let none = BTreeSet::new();
        let items = vec![
            NavItem::new("Shared", "/shared"),
            NavItem::new("Acme", "/acme").for_tenant("acme"),
            NavItem::new("Globex", "/globex").for_tenant("globex"),
        ];
        let filter = NavFilter::standard().with_stage("tenant", tenant_acme);
        assert_eq!(
            filter.stage_names().collect::<Vec<_>>(),
            vec!["scope", "persona", "role", "permission", "tenant"]
        );
        let visible = filter.apply(&items, &input(None, None, &none, &none));
        assert_eq!(titles(&visible), vec!["Shared", "Acme"]);
    }
}
