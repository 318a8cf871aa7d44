//! Error taxonomy of the service
//!
//! Lower layers keep their own error enums; everything surfacing from
//! [`TaskDeck`](crate::TaskDeck) is a [`DeckError`].

use taskdeck_model::{FieldError, ModelError, TaskGroupId};
use taskdeck_ordering::{OrderError, OrderViolation};
use taskdeck_policy::{Action, DenyReason, PolicyError};
use taskdeck_store::StoreError;

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    /// Permission or access-scope denial; always terminal
    #[error("unauthorized: {action} denied: {reason}")]
    Unauthorized {
        /// Requested action
        action: Action,
        /// First failed policy step
        reason: DenyReason,
    },

    /// Reorder/move sequence does not match the group
    #[error("invalid order set for {group}: {violation}")]
    InvalidOrderSet {
        /// Group the sequence targeted
        group: TaskGroupId,
        /// First problem found
        violation: OrderViolation,
    },

    /// Malformed mutation input, with per-field detail
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Lost a race on ranks, groups or grants; retry with fresh state
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Missing or archived record
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record kind
        entity: &'static str,
        /// Raw id
        id: u64,
    },

    /// Operation exceeded its time bound
    #[error("operation timed out after {duration_ms}ms")]
    Timeout {
        /// Bound that was exceeded
        duration_ms: u64,
    },

    /// Generic persistence failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DeckError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict(_) | Self::Timeout { .. } | Self::Storage(_)
        )
    }

    /// Authorization failure
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Missing record helper
    #[inline]
    #[must_use]
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Single-field validation failure
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Field-level detail, if this is a validation failure
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Validation(fields) => fields,
            _ => &[],
        }
    }
}

impl From<PolicyError> for DeckError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Denied { action, reason } => Self::Unauthorized { action, reason },
            PolicyError::Config(msg) => Self::Config(msg),
        }
    }
}

impl From<ModelError> for DeckError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(fields) => Self::Validation(fields),
            other => Self::Validation(vec![FieldError::new("input", other.to_string())]),
        }
    }
}

impl From<StoreError> for DeckError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::LockTimeout { .. } => Self::ConcurrencyConflict(err.to_string()),
            StoreError::ForeignKey {
                entity: _,
                references,
                id,
            } => Self::NotFound {
                entity: references,
                id,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<OrderError> for DeckError {
    fn from(err: OrderError) -> Self {
        if err.is_conflict() {
            return Self::ConcurrencyConflict(err.to_string());
        }
        match err {
            OrderError::InvalidOrderSet { group, violation } => {
                Self::InvalidOrderSet { group, violation }
            }
            OrderError::GroupNotFound(id) => Self::not_found("task group", id.get()),
            OrderError::TaskNotFound(id) => Self::not_found("task", id.get()),
            OrderError::CrossProject { .. } => Self::field("to_group_id", err.to_string()),
            OrderError::Store(store) => store.into(),
            OrderError::VersionConflict { .. } => Self::ConcurrencyConflict(err.to_string()),
        }
    }
}
