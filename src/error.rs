use thiserror::Error;

use crate::core::FieldPath;

/// Errors raised while parsing or compiling filter trees.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A rule references a `(field, subField)` pair the registry does not declare.
    #[error("filterable field not found: {0}")]
    UnregisteredField(FieldPath),
    /// The JSON value does not describe a filter group or rule.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FilterError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }
}
