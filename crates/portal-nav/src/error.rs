//! Error types for navigation catalogs

/// Catalog consistency failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two contexts share an id
    #[error("duplicate context id: {0}")]
    DuplicateContext(String),

    /// Two personas share an id
    #[error("duplicate persona id: {0}")]
    DuplicatePersona(String),

    /// Item scoped to a context nobody declared
    #[error("nav item '{title}' references unknown context '{context_id}'")]
    UnknownContext { title: String, context_id: String },

    /// Sentinel used as a declared id
    #[error("'{0}' is reserved and cannot be declared")]
    ReservedId(String),
}
