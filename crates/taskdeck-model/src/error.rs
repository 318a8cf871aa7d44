//! Error types for the domain model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised while building or validating model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Role name not in the catalog
    #[error("unknown role: '{0}'")]
    UnknownRole(String),

    /// Permission name not in the catalog
    #[error("unknown permission: '{0}'")]
    UnknownPermission(String),

    /// Input failed field validation
    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),
}

impl ModelError {
    /// Single-field validation failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }
}

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Input field name
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldError {
    /// Create new field error
    #[inline]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
