//! Breadcrumb bridge
//!
//! A one-way, last-write-wins channel from the active mini-app to the host
//! shell. The shell owns the [`BreadcrumbBridge`]; mini-apps only ever see a
//! [`BreadcrumbPublisher`] through their [`MountContext`](crate::MountContext).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// One crumb of a trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub href: String,
}

impl Breadcrumb {
    /// Create crumb
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

/// Wire payload of a "set breadcrumbs" signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbUpdate {
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Signal sent by a mini-app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreadcrumbSignal {
    /// Replace the host trail
    Set(Vec<Breadcrumb>),
    /// Revert to path-derived crumbs
    Reset,
}

impl From<BreadcrumbUpdate> for BreadcrumbSignal {
    fn from(update: BreadcrumbUpdate) -> Self {
        Self::Set(update.breadcrumbs)
    }
}

type Override = Option<Arc<[Breadcrumb]>>;

/// Host-owned breadcrumb channel
#[derive(Debug, Clone)]
pub struct BreadcrumbBridge {
    tx: Arc<watch::Sender<Override>>,
}

impl BreadcrumbBridge {
    /// Create bridge with no override
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Capability handed to mini-apps
    #[inline]
    #[must_use]
    pub fn publisher(&self) -> BreadcrumbPublisher {
        BreadcrumbPublisher {
            tx: self.tx.clone(),
        }
    }

    /// Listen for overrides
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> BreadcrumbSubscription {
        BreadcrumbSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Current override, if any
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<Vec<Breadcrumb>> {
        self.tx.borrow().as_deref().map(<[Breadcrumb]>::to_vec)
    }
}

impl Default for BreadcrumbBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending half given to mini-apps
#[derive(Debug, Clone)]
pub struct BreadcrumbPublisher {
    tx: Arc<watch::Sender<Override>>,
}

impl BreadcrumbPublisher {
    /// Fire a signal; never blocks, never acknowledged
    pub fn send(&self, signal: BreadcrumbSignal) {
        let next: Override = match signal {
            BreadcrumbSignal::Set(trail) => Some(Arc::from(trail)),
            BreadcrumbSignal::Reset => None,
        };
        tracing::trace!(override_set = next.is_some(), "breadcrumb signal");
        self.tx.send_replace(next);
    }

    /// Replace the host trail
    #[inline]
    pub fn set(&self, trail: impl IntoIterator<Item = Breadcrumb>) {
        self.send(BreadcrumbSignal::Set(trail.into_iter().collect()));
    }

    /// Revert to path-derived crumbs
    #[inline]
    pub fn reset(&self) {
        self.send(BreadcrumbSignal::Reset);
    }
}

/// Receiving half used by the host
#[derive(Debug, Clone)]
pub struct BreadcrumbSubscription {
    rx: watch::Receiver<Override>,
}

impl BreadcrumbSubscription {
    /// Latest override without waiting
    #[must_use]
    pub fn current(&self) -> Option<Vec<Breadcrumb>> {
        self.rx.borrow().as_deref().map(<[Breadcrumb]>::to_vec)
    }

    /// Check if a signal arrived since the last [`Self::mark_seen`]
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Acknowledge the latest signal locally
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Wait for the next signal; `None` once the bridge is gone
    pub async fn changed(&mut self) -> Option<Option<Vec<Breadcrumb>>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().as_deref().map(<[Breadcrumb]>::to_vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let bridge = BreadcrumbBridge::new();
        let publisher = bridge.publisher();
        let sub = bridge.subscribe();

        publisher.set([Breadcrumb::new("A", "/a")]);
        publisher.set([Breadcrumb::new("B", "/b"), Breadcrumb::new("C", "/b/c")]);

        let current = sub.current().unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0].label, "B");
        assert_eq!(bridge.current(), Some(current));
    }

    #[test]
    fn reset_clears_override() {
        let bridge = BreadcrumbBridge::new();
        let publisher = bridge.publisher();
        publisher.set([Breadcrumb::new("A", "/a")]);
        publisher.reset();
        assert!(bridge.current().is_none());
    }

    #[test]
    fn update_payload_decodes() {
        let raw = r#"{"breadcrumbs":[{"label":"Tables","href":"/portal/apps/mix-db/tables"}]}"#;
        let update: BreadcrumbUpdate = serde_json::from_str(raw).unwrap();
        let signal = BreadcrumbSignal::from(update);
        assert_eq!(
            signal,
            BreadcrumbSignal::Set(vec![Breadcrumb::new("Tables", "/portal/apps/mix-db/tables")])
        );
    }

    #[tokio::test]
    async fn subscription_sees_changes() {
        let bridge = BreadcrumbBridge::new();
        let mut sub = bridge.subscribe();
        assert!(!sub.has_changed());

        bridge.publisher().set([Breadcrumb::new("A", "/a")]);
        assert!(sub.has_changed());

        let next = sub.changed().await.unwrap();
        assert_eq!(next.unwrap()[0].href, "/a");
        assert!(!sub.has_changed());
    }
}
