//! Entity records
//!
//! These mirror the rows of the relational schema. Relations are stored as
//! id sets on the owning side; the store keeps them consistent.

use crate::archive::Archival;
use crate::id::{
    ClientCompanyId, CommentId, LabelId, ProjectId, TaskGroupId, TaskId, TeamId, TimeLogId,
    UserId,
};
use crate::role::Role;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Application user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub job_title: Option<String>,
    /// Assigned roles; effective capability is the union over all of them
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    /// Client companies this user represents
    #[serde(default)]
    pub client_company_ids: BTreeSet<ClientCompanyId>,
    /// Hourly rate in minor currency units
    #[serde(default)]
    pub rate: Option<u64>,
    #[serde(default)]
    pub archival: Archival,
}

impl User {
    /// Create user without roles
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            job_title: None,
            roles: BTreeSet::new(),
            client_company_ids: BTreeSet::new(),
            rate: None,
            archival: Archival::active(),
        }
    }

    /// Add a role
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Associate with a client company
    #[must_use]
    pub fn with_company(mut self, company: ClientCompanyId) -> Self {
        self.client_company_ids.insert(company);
        self
    }

    /// Role membership test
    #[inline]
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Holds the admin role
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

/// Team of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub members: BTreeSet<UserId>,
}

impl Team {
    /// Create empty team
    #[must_use]
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: BTreeSet::new(),
        }
    }

    /// Add member
    #[must_use]
    pub fn with_member(mut self, user: UserId) -> Self {
        self.members.insert(user);
        self
    }

    /// Membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }
}

/// Client company a project may belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCompany {
    pub id: ClientCompanyId,
    pub name: String,
}

/// Project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_company_id: Option<ClientCompanyId>,
    /// Hourly rate in minor currency units
    #[serde(default)]
    pub rate: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archival: Archival,
}

impl Project {
    /// Create active project
    #[must_use]
    pub fn new(id: ProjectId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            client_company_id: None,
            rate: None,
            created_at,
            archival: Archival::active(),
        }
    }

    /// Attach to a client company
    #[must_use]
    pub fn with_company(mut self, company: ClientCompanyId) -> Self {
        self.client_company_id = Some(company);
        self
    }
}

/// Ordered bucket of tasks inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroup {
    pub id: TaskGroupId,
    pub project_id: ProjectId,
    pub name: String,
    /// Position among the project's groups
    #[serde(default)]
    pub position: u32,
    /// Bumped on every reorder/move touching this group
    #[serde(default)]
    pub version: u64,
}

impl TaskGroup {
    /// Create group at `position`
    #[must_use]
    pub fn new(id: TaskGroupId, project_id: ProjectId, name: impl Into<String>, position: u32) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            position,
            version: 0,
        }
    }
}

/// How a task is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Pricing {
    /// Billed through logged time
    #[default]
    Hourly,
    /// Flat fee in minor currency units
    Fixed { amount: u64 },
}

/// File attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
}

/// Task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    /// `None` means ungrouped
    pub group_id: Option<TaskGroupId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: UserId,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Position within (project, group); only the ordering engine writes it
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    #[serde(default)]
    pub subscribers: BTreeSet<UserId>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default = "default_billable")]
    pub billable: bool,
    #[serde(default)]
    pub pricing: Pricing,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archival: Archival,
}

fn default_billable() -> bool {
    true
}

impl Task {
    /// Create an incomplete, unassigned task
    #[must_use]
    pub fn new(
        id: TaskId,
        project_id: ProjectId,
        group_id: Option<TaskGroupId>,
        name: impl Into<String>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            project_id,
            group_id,
            name: name.into(),
            description: None,
            created_by,
            assigned_to: None,
            assigned_at: None,
            due_on: None,
            completed_at: None,
            rank: 0,
            labels: BTreeSet::new(),
            subscribers: BTreeSet::new(),
            attachments: Vec::new(),
            billable: true,
            pricing: Pricing::Hourly,
            created_at,
            archival: Archival::active(),
        }
    }

    /// Completed tasks carry a completion timestamp
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Due strictly before `today` and not completed
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_on.is_some_and(|due| due < today)
    }

    /// Fixed fee, if priced that way
    #[inline]
    #[must_use]
    pub fn fixed_price(&self) -> Option<u64> {
        match self.pricing {
            Pricing::Fixed { amount } => Some(amount),
            Pricing::Hourly => None,
        }
    }
}

/// Comment on a task (append-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Logged working time (immutable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLog {
    pub id: TimeLogId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub minutes: u32,
    pub billable: bool,
    pub created_at: DateTime<Utc>,
}
