//! Error types for the policy engine

use crate::action::Action;
use taskdeck_model::{Permission, ProjectId, TaskId};

/// Why an authorization was denied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    /// None of the actor's roles carries the permission
    #[error("missing permission '{0}'")]
    MissingPermission(Permission),

    /// No admin role, grant, inherited grant or company match
    #[error("no access to {0}")]
    NoProjectAccess(ProjectId),

    /// Access to the project, but the task-level rule refuses
    #[error("{rule} on {task}")]
    TaskRule {
        /// Task the rule was evaluated on
        task: TaskId,
        /// Rule that refused
        rule: &'static str,
    },

    /// Client-only actors never mutate tasks
    #[error("clients cannot modify tasks")]
    ClientReadOnly,
}

/// Policy errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Explicit, terminal deny
    #[error("{action} denied: {reason}")]
    Denied {
        /// Requested action
        action: Action,
        /// Why
        reason: DenyReason,
    },

    /// Invalid permission table configuration
    #[error("invalid policy configuration: {0}")]
    Config(String),
}

impl PolicyError {
    /// Create deny error
    #[inline]
    #[must_use]
    pub fn denied(action: Action, reason: DenyReason) -> Self {
        Self::Denied { action, reason }
    }

    /// Deny reason, if this is a deny
    #[must_use]
    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Denied { reason, .. } => Some(reason),
            Self::Config(_) => None,
        }
    }
}
