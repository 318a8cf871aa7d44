//! The service facade
//!
//! [`TaskDeck`] owns the store, the policy engine, the ordering engine and
//! the event sink. Every operation takes the acting user explicitly as an
//! [`Actor`] and authorizes before it reads anything privileged.
//!
//! Operations are split by area across sibling modules (`projects`,
//! `tasks`, `access`, `labels`, `teams`, `activity`, `report`), each adding
//! an `impl TaskDeck` block.

use crate::config::DeckConfig;
use crate::error::DeckError;
use crate::events::{self, EventSink, NullSink};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use taskdeck_model::{DomainEvent, Permission, Project, ProjectId, Task, TaskId, UserId};
use taskdeck_ordering::OrderingEngine;
use taskdeck_policy::{
    AccessBasis, AccessPolicy, Action, Actor, PermissionTable, ProjectScope, Target,
};
use taskdeck_store::{KeyedLocks, MemoryStore, Tables};

/// Target of an authorization query, by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TargetRef {
    Project(ProjectId),
    Task(TaskId),
}

/// Project management service
pub struct TaskDeck {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) config: DeckConfig,
    pub(crate) policy: AccessPolicy,
    pub(crate) permissions: PermissionTable,
    pub(crate) ordering: OrderingEngine,
    pub(crate) grant_locks: KeyedLocks<ProjectId>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for TaskDeck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDeck")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TaskDeck {
    /// Create service over `store`, discarding events
    ///
    /// # Errors
    /// `DeckError::Config` if the configured permission table is invalid.
    pub fn new(store: Arc<MemoryStore>, config: DeckConfig) -> Result<Self, DeckError> {
        let permissions = config.permission_table()?;
        tracing::info!(
            "taskdeck ready (team inheritance: {:?}, lock timeout: {}ms)",
            config.team_inheritance,
            config.lock_timeout_ms
        );
        Ok(Self {
            store,
            policy: AccessPolicy::new(config.policy_config()),
            permissions,
            ordering: OrderingEngine::new(config.lock_timeout()),
            grant_locks: KeyedLocks::new(),
            events: Arc::new(NullSink),
            config,
        })
    }

    /// With event sink
    #[inline]
    #[must_use]
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Resolve the acting user: roles, permissions, teams and companies
    ///
    /// # Errors
    /// `NotFound` for unknown or archived users.
    pub fn actor(&self, user: UserId) -> Result<Actor, DeckError> {
        let tables = self.store.read();
        resolve_actor(&tables, &self.permissions, user)
    }

    /// Decide whether `actor` may perform `action` on `target`
    ///
    /// # Errors
    /// `Unauthorized` on deny, `NotFound` for an unknown target.
    pub fn authorize(
        &self,
        actor: &Actor,
        action: Action,
        target: TargetRef,
    ) -> Result<AccessBasis, DeckError> {
        let tables = self.store.read();
        match target {
            TargetRef::Project(id) => {
                let project = project_row(&tables, id)?;
                self.check(&tables, actor, action, Target::Project(project))
            }
            TargetRef::Task(id) => {
                let task = task_row(&tables, id)?;
                let project = project_row(&tables, task.project_id)?;
                self.check(&tables, actor, action, Target::Task(task, project))
            }
        }
    }

    /// Projects and tasks `actor` can see
    #[must_use]
    pub fn scope(&self, actor: &Actor) -> ProjectScope {
        let tables = self.store.read();
        self.scope_in(&tables, actor)
    }

    pub(crate) fn scope_in(&self, tables: &Tables, actor: &Actor) -> ProjectScope {
        let scope = ProjectScope::resolve(&self.policy, actor, tables, tables.projects());
        tracing::debug!(
            "scope for {}: {}",
            actor.user_id,
            scope
                .project_ids()
                .map_or_else(|| "all projects".to_owned(), |ids| format!("{} projects", ids.len()))
        );
        scope
    }

    pub(crate) fn check(
        &self,
        tables: &Tables,
        actor: &Actor,
        action: Action,
        target: Target<'_>,
    ) -> Result<AccessBasis, DeckError> {
        self.policy
            .authorize(actor, action, target, tables)
            .map_err(|err| {
                tracing::warn!(
                    "denied {} on {} for {}: {}",
                    action,
                    target.project().id,
                    actor.user_id,
                    err
                );
                DeckError::from(err)
            })
    }

    pub(crate) fn require(
        &self,
        actor: &Actor,
        action: Action,
        perm: Permission,
    ) -> Result<(), DeckError> {
        self.policy
            .require_permission(actor, action, perm)
            .map_err(|err| {
                tracing::warn!("denied {} for {}: {}", action, actor.user_id, err);
                DeckError::from(err)
            })
    }

    /// Run a mutation under the configured operation timeout
    pub(crate) async fn bounded<T, F>(&self, op: F) -> Result<T, DeckError>
    where
        F: Future<Output = Result<T, DeckError>>,
    {
        let limit = self.config.operation_timeout();
        tokio::time::timeout(limit, op).await.map_err(|_| {
            tracing::warn!("operation exceeded {}ms", self.config.operation_timeout_ms);
            DeckError::Timeout {
                duration_ms: self.config.operation_timeout_ms,
            }
        })?
    }

    pub(crate) async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            events::emit(self.events.as_ref(), event).await;
        }
    }
}

pub(crate) fn resolve_actor(
    tables: &Tables,
    permissions: &PermissionTable,
    user: UserId,
) -> Result<Actor, DeckError> {
    let row = tables
        .user(user)
        .filter(|u| u.archival.is_active())
        .ok_or_else(|| DeckError::not_found("user", user.get()))?;
    Ok(Actor::resolve(row, tables.teams_of(user), permissions))
}

pub(crate) fn project_row(tables: &Tables, id: ProjectId) -> Result<&Project, DeckError> {
    tables
        .project(id)
        .ok_or_else(|| DeckError::not_found("project", id.get()))
}

pub(crate) fn active_project(tables: &Tables, id: ProjectId) -> Result<&Project, DeckError> {
    project_row(tables, id)
        .ok()
        .filter(|p| p.archival.is_active())
        .ok_or_else(|| DeckError::not_found("project", id.get()))
}

pub(crate) fn task_row(tables: &Tables, id: TaskId) -> Result<&Task, DeckError> {
    tables
        .task(id)
        .ok_or_else(|| DeckError::not_found("task", id.get()))
}

pub(crate) fn active_task(tables: &Tables, id: TaskId) -> Result<&Task, DeckError> {
    task_row(tables, id)
        .ok()
        .filter(|t| t.archival.is_active())
        .ok_or_else(|| DeckError::not_found("task", id.get()))
}
