//! App resolution
//!
//! Turns a requested app id into a renderable module or a contained error.
//! Each call to [`AppResolver::resolve`] starts a new request; results of
//! older requests are discarded when they arrive, so a slow load can never
//! overwrite a newer selection.

use crate::bridge::BreadcrumbPublisher;
use crate::config::AppId;
use crate::error::AppError;
use crate::module::{MiniAppModule, MountContext};
use crate::registry::AppRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Resolution state of the current request
#[derive(Debug, Clone, Default)]
pub enum Resolution {
    /// Nothing requested
    #[default]
    Idle,
    /// Load in progress; no previous module is exposed
    Loading { app_id: AppId },
    /// Module ready to render
    Resolved {
        app_id: AppId,
        module: Arc<MiniAppModule>,
    },
    /// Terminal failure for this request
    Failed {
        app_id: AppId,
        message: String,
        error: AppError,
    },
}

impl Resolution {
    /// Requested app, if any
    #[inline]
    #[must_use]
    pub fn app_id(&self) -> Option<&AppId> {
        match self {
            Self::Idle => None,
            Self::Loading { app_id }
            | Self::Resolved { app_id, .. }
            | Self::Failed { app_id, .. } => Some(app_id),
        }
    }

    /// Resolved module
    #[inline]
    #[must_use]
    pub fn module(&self) -> Option<&Arc<MiniAppModule>> {
        match self {
            Self::Resolved { module, .. } => Some(module),
            _ => None,
        }
    }

    /// Failure of this request
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Check if a load is in progress
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    fn failed(error: AppError) -> Self {
        Self::Failed {
            app_id: error.app_id().clone(),
            message: error.user_message(),
            error,
        }
    }
}

/// What the host should draw for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppView {
    /// No app requested
    Idle,
    /// Module still loading
    Loading {
        /// Requested app
        app_id: AppId,
    },
    /// Load failed; the host offers a retry
    Error {
        /// Requested app
        app_id: AppId,
        /// User-facing failure text
        message: String,
    },
    /// Module rendered
    App {
        /// Rendered app
        app_id: AppId,
        /// Display name
        title: String,
        /// Component output
        body: String,
    },
}

#[derive(Debug, Default)]
struct ResolverState {
    request: u64,
    resolution: Resolution,
}

/// Per-shell app resolution component
#[derive(Debug)]
pub struct AppResolver {
    registry: Arc<AppRegistry>,
    breadcrumbs: BreadcrumbPublisher,
    state: watch::Sender<ResolverState>,
}

impl AppResolver {
    /// Create resolver over a shared registry
    #[must_use]
    pub fn new(registry: Arc<AppRegistry>, breadcrumbs: BreadcrumbPublisher) -> Self {
        let (state, _rx) = watch::channel(ResolverState::default());
        Self {
            registry,
            breadcrumbs,
            state,
        }
    }

    /// Registry this resolver reads from
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<AppRegistry> {
        &self.registry
    }

    /// Current resolution
    #[inline]
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.state.borrow().resolution.clone()
    }

    /// Wait for the next resolution change
    pub async fn changed(&self) -> Resolution {
        let mut rx = self.state.subscribe();
        // A dropped sender cannot happen while `self` is borrowed
        let _ = rx.changed().await;
        let resolution = rx.borrow().resolution.clone();
        resolution
    }

    /// Resolve `app_id`, or the registry's restore hint for `None`
    ///
    /// Returns the resolution current when this call finishes, which is a
    /// newer request's state if this one was overtaken.
    pub async fn resolve(&self, app_id: Option<&str>) -> Resolution {
        let target = match app_id {
            Some(id) => Some(AppId::from(id)),
            None => self.registry.restored_app_id(),
        };

        let Some(app_id) = target else {
            self.begin(Resolution::Idle);
            return Resolution::Idle;
        };

        let request = self.begin(Resolution::Loading {
            app_id: app_id.clone(),
        });
        debug!(app_id = %app_id, request, "resolving app");

        if let Some(module) = self.registry.get_app(app_id.as_str()) {
            return self.commit_module(request, app_id, module);
        }

        let Some(locator) = self.registry.loader().locate(app_id.as_str()) else {
            return self.commit(request, Resolution::failed(AppError::UnknownApp(app_id)));
        };

        match self.registry.load_app(app_id.clone(), &locator).await {
            Ok(module) => self.commit_module(request, app_id, module),
            Err(AppError::Superseded(_)) if self.is_current(request) => {
                // Someone else's newer load of the same app owns the outcome
                match self.registry.settle(app_id.as_str()).await {
                    Some(module) => self.commit_module(request, app_id, module),
                    None => {
                        let error = self
                            .registry
                            .last_error()
                            .filter(|e| e.app_id() == &app_id)
                            .unwrap_or(AppError::Superseded(app_id));
                        self.commit(request, Resolution::failed(error))
                    }
                }
            }
            Err(error) => self.commit(request, Resolution::failed(error)),
        }
    }

    /// Re-run the current request (user-initiated retry)
    pub async fn retry(&self) -> Resolution {
        let current = self.resolution();
        match current.app_id() {
            Some(app_id) => self.resolve(Some(app_id.as_str())).await,
            None => current,
        }
    }

    /// View for the current resolution, mounting the app at `path`
    #[must_use]
    pub fn render(&self, path: &str) -> AppView {
        match self.resolution() {
            Resolution::Idle => AppView::Idle,
            Resolution::Loading { app_id } => AppView::Loading { app_id },
            Resolution::Failed {
                app_id, message, ..
            } => AppView::Error { app_id, message },
            Resolution::Resolved { app_id, module } => {
                let ctx = MountContext {
                    app_id: app_id.clone(),
                    path: path.to_string(),
                    breadcrumbs: self.breadcrumbs.clone(),
                };
                AppView::App {
                    title: module.config().display_name.clone(),
                    body: module.render(&ctx),
                    app_id,
                }
            }
        }
    }

    /// Start a new request, dropping whatever the previous one produced
    fn begin(&self, resolution: Resolution) -> u64 {
        let mut request = 0;
        self.state.send_modify(|state| {
            state.request += 1;
            state.resolution = resolution;
            request = state.request;
        });
        request
    }

    fn is_current(&self, request: u64) -> bool {
        self.state.borrow().request == request
    }

    fn commit_module(&self, request: u64, app_id: AppId, module: Arc<MiniAppModule>) -> Resolution {
        let resolved = Resolution::Resolved {
            app_id: app_id.clone(),
            module,
        };
        let resolution = self.commit(request, resolved);
        if self.is_current(request) {
            self.registry.set_active_app(Some(app_id.as_str()));
        }
        resolution
    }

    fn commit(&self, request: u64, resolution: Resolution) -> Resolution {
        let mut committed = false;
        self.state.send_if_modified(|state| {
            if state.request != request {
                return false;
            }
            state.resolution = resolution.clone();
            committed = true;
            true
        });

        if committed {
            if let Resolution::Failed { error, .. } = &resolution {
                warn!(app_id = %error.app_id(), error = %error, "app resolution failed");
            }
            resolution
        } else {
            debug!(request, "discarding result of superseded request");
            self.resolution()
        }
    }
}
