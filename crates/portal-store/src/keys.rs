//! Persisted key names shared by the registry and the navigation provider

/// Active mini-app id
pub const ACTIVE_APP_ID: &str = "portal.activeAppId";

/// Active navigation context id
pub const ACTIVE_CONTEXT_ID: &str = "portal.activeContextId";

/// Active persona id
pub const ACTIVE_PERSONA_ID: &str = "portal.activePersonaId";

/// Tenant-enabled context ids, JSON-encoded array
pub const TENANT_ENABLED_CONTEXTS: &str = "portal.tenantEnabledContexts";
