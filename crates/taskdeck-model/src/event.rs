//! Domain events
//!
//! Emitted after a mutation commits, for the live-update broadcaster.
//! Delivery is best effort; nothing in the core depends on it.

use crate::id::{ProjectId, TaskGroupId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Committed change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Tasks reordered inside one group
    TaskOrderChanged {
        project_id: ProjectId,
        group_id: TaskGroupId,
        from_index: usize,
        to_index: usize,
    },
    /// Tasks moved between groups
    TaskGroupChanged {
        project_id: ProjectId,
        from_group_id: TaskGroupId,
        to_group_id: TaskGroupId,
        from_index: usize,
        to_index: usize,
    },
    /// One field of a task changed
    TaskUpdated {
        project_id: ProjectId,
        task_id: TaskId,
        field: String,
    },
    /// Task archived
    TaskDeleted {
        project_id: ProjectId,
        task_id: TaskId,
    },
    /// Task restored from the archive
    TaskRestored {
        project_id: ProjectId,
        task_id: TaskId,
    },
}

impl DomainEvent {
    /// Project the event belongs to (the broadcast channel key)
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        match self {
            DomainEvent::TaskOrderChanged { project_id, .. }
            | DomainEvent::TaskGroupChanged { project_id, .. }
            | DomainEvent::TaskUpdated { project_id, .. }
            | DomainEvent::TaskDeleted { project_id, .. }
            | DomainEvent::TaskRestored { project_id, .. } => *project_id,
        }
    }

    /// Short event name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::TaskOrderChanged { .. } => "task_order_changed",
            DomainEvent::TaskGroupChanged { .. } => "task_group_changed",
            DomainEvent::TaskUpdated { .. } => "task_updated",
            DomainEvent::TaskDeleted { .. } => "task_deleted",
            DomainEvent::TaskRestored { .. } => "task_restored",
        }
    }
}

/// Event with delivery metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: DomainEvent,
}

impl EventEnvelope {
    /// Wrap an event stamped now
    #[must_use]
    pub fn new(event: DomainEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }
}
