//! Host breadcrumb trail
//!
//! Path-derived crumbs unless the active mini-app has published an override
//! through the bridge.

use portal_apps::{Breadcrumb, BreadcrumbBridge, BreadcrumbSubscription};

/// Trail shown by the shell
#[derive(Debug, Clone)]
pub struct BreadcrumbTrail {
    subscription: BreadcrumbSubscription,
}

impl BreadcrumbTrail {
    /// Listen on `bridge`
    #[must_use]
    pub fn new(bridge: &BreadcrumbBridge) -> Self {
        Self {
            subscription: bridge.subscribe(),
        }
    }

    /// Trail for `path`: the override if present, else derived from the path
    #[must_use]
    pub fn current(&self, path: &str) -> Vec<Breadcrumb> {
        self.subscription
            .current()
            .unwrap_or_else(|| Self::derive(path))
    }

    /// Check if a mini-app override is showing
    #[must_use]
    pub fn is_overridden(&self) -> bool {
        self.subscription.current().is_some()
    }

    /// One crumb per path segment, each linking to its prefix
    #[must_use]
    pub fn derive(path: &str) -> Vec<Breadcrumb> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let mut href = String::new();
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                href.push('/');
                href.push_str(segment);
                Breadcrumb::new(label_for(segment), href.clone())
            })
            .collect()
    }
}

fn label_for(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
