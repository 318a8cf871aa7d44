//! Ordering errors

use taskdeck_model::{TaskGroupId, TaskId};
use taskdeck_store::StoreError;

/// Why a proposed order is not a valid order set for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrderViolation {
    /// Same id listed twice
    #[error("{0} listed more than once")]
    Duplicate(TaskId),

    /// Id not in the group (or not in the move's source group)
    #[error("{0} does not belong to the group")]
    Foreign(TaskId),

    /// Group member left out of the sequence
    #[error("{0} is missing from the sequence")]
    Missing(TaskId),

    /// Move request that moves nothing
    #[error("no task from the source group is in the sequence")]
    NothingMoved,
}

/// Ordering engine errors
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Proposed sequence rejected; nothing was written
    #[error("invalid order set for {group}: {violation}")]
    InvalidOrderSet {
        /// Group the sequence was meant for
        group: TaskGroupId,
        /// First problem found
        violation: OrderViolation,
    },

    /// Group does not exist
    #[error("{0} not found")]
    GroupNotFound(TaskGroupId),

    /// Task does not exist or is archived
    #[error("{0} not found")]
    TaskNotFound(TaskId),

    /// Move between groups of different projects
    #[error("{from} and {to} belong to different projects")]
    CrossProject {
        /// Source group
        from: TaskGroupId,
        /// Destination group
        to: TaskGroupId,
    },

    /// Group changed since the caller read it
    #[error("{group} changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Group whose version moved on
        group: TaskGroupId,
        /// Version the caller saw
        expected: u64,
        /// Current version
        actual: u64,
    },

    /// Store failure, including lock timeouts
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Lost a race: retrying with fresh state may succeed
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::Store(StoreError::LockTimeout { .. })
        )
    }

    /// Check if retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_conflict() || matches!(self, Self::Store(_))
    }

    #[inline]
    pub(crate) fn invalid(group: TaskGroupId, violation: OrderViolation) -> Self {
        Self::InvalidOrderSet { group, violation }
    }
}
