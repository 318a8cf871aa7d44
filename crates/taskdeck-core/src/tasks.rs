//! Task lifecycle, listings and ordering

use crate::deck::{active_project, active_task, project_row, task_row, TaskDeck};
use crate::error::DeckError;
use chrono::Utc;
use std::collections::BTreeSet;
use taskdeck_model::{
    ArchiveFilter, DomainEvent, LabelId, NewTask, ProjectId, Task, TaskGroupId, TaskId,
    TaskUpdate, UserId,
};
use taskdeck_ordering::{MoveRequest, OrderChange, ReorderRequest};
use taskdeck_policy::{Action, Actor, DenyReason, Target, TaskVisibility};
use taskdeck_store::Tables;

impl TaskDeck {
    /// Visible active tasks of a group in rank order
    ///
    /// # Errors
    /// `NotFound`, or `Unauthorized` without access to the group's project.
    pub fn list_tasks_for_group(
        &self,
        actor: &Actor,
        group: TaskGroupId,
        include_completed: bool,
    ) -> Result<Vec<Task>, DeckError> {
        let tables = self.store.read();
        let project = group_project(&tables, group)?;
        let project = active_project(&tables, project)?;
        self.check(&tables, actor, Action::View, Target::Project(project))?;

        let visibility = TaskVisibility::for_actor(actor);
        Ok(tables
            .group_tasks(group, ArchiveFilter::Active)
            .into_iter()
            .filter(|t| visibility.admits(t) && (include_completed || !t.is_completed()))
            .cloned()
            .collect())
    }

    /// One task
    ///
    /// # Errors
    /// `NotFound`, or `Unauthorized` if the task is not visible.
    pub fn task(&self, actor: &Actor, id: TaskId) -> Result<Task, DeckError> {
        let tables = self.store.read();
        let task = task_row(&tables, id)?;
        let project = project_row(&tables, task.project_id)?;
        self.check(&tables, actor, Action::View, Target::Task(task, project))?;
        Ok(task.clone())
    }

    /// Create a task at the end of its group
    ///
    /// # Errors
    /// `Unauthorized`, or `Validation` for a missing name or group, a group of
    /// another project, or unknown assignee, subscribers or labels.
    pub async fn create_task(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        input: NewTask,
    ) -> Result<Task, DeckError> {
        input.validate()?;
        self.bounded(async {
            let mut tx = self.store.begin();
            let project = active_project(&tx, project_id)?;
            self.check(&tx, actor, Action::Create, Target::Project(project))?;

            let group = input
                .group_id
                .ok_or_else(|| DeckError::field("group_id", "task group is required"))?;
            if tx.group(group).map(|g| g.project_id) != Some(project_id) {
                return Err(DeckError::field("group_id", "task group does not belong to the project"));
            }
            if let Some(user) = input.assigned_to {
                check_user(&tx, "assigned_to", user)?;
            }
            for user in &input.subscribers {
                check_user(&tx, "subscribers", *user)?;
            }
            check_labels(&tx, &input.labels)?;

            let now = Utc::now();
            let rank = next_rank(&tx, group);
            let mut task = Task::new(
                TaskId(tx.next_id()),
                project_id,
                Some(group),
                input.name.trim(),
                actor.user_id,
                now,
            );
            task.description = input.description;
            task.assigned_to = input.assigned_to;
            task.assigned_at = input.assigned_to.map(|_| now);
            task.due_on = input.due_on;
            task.labels = input.labels;
            task.subscribers = input.subscribers;
            task.attachments = input.attachments;
            task.billable = input.billable;
            task.pricing = input.pricing;
            task.rank = rank;
            tx.put_task(task.clone())?;
            tx.commit();

            tracing::info!("created {} in {} by {}", task.id, group, actor.user_id);
            Ok(task)
        })
        .await
    }

    /// Edit a task; one `TaskUpdated` event per changed field
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` or `Validation`.
    pub async fn update_task(
        &self,
        actor: &Actor,
        id: TaskId,
        update: TaskUpdate,
    ) -> Result<Task, DeckError> {
        update.validate()?;
        let (task, changed) = self
            .bounded(async {
                let mut tx = self.store.begin();
                let mut task = active_task(&tx, id)?.clone();
                let project = project_row(&tx, task.project_id)?;
                self.check(&tx, actor, Action::Update, Target::Task(&task, project))?;

                let mut changed = Vec::new();
                if let Some(name) = update.name {
                    let name = name.trim().to_owned();
                    if name != task.name {
                        task.name = name;
                        changed.push("name");
                    }
                }
                if let Some(description) = update.description {
                    if description != task.description {
                        task.description = description;
                        changed.push("description");
                    }
                }
                if let Some(assignee) = update.assigned_to {
                    if let Some(user) = assignee {
                        check_user(&tx, "assigned_to", user)?;
                    }
                    if assignee != task.assigned_to {
                        task.assigned_to = assignee;
                        task.assigned_at = assignee.map(|_| Utc::now());
                        changed.push("assigned_to");
                    }
                }
                if let Some(due_on) = update.due_on {
                    if due_on != task.due_on {
                        task.due_on = due_on;
                        changed.push("due_on");
                    }
                }
                if let Some(labels) = update.labels {
                    check_labels(&tx, &labels)?;
                    if labels != task.labels {
                        task.labels = labels;
                        changed.push("labels");
                    }
                }
                if let Some(subscribers) = update.subscribers {
                    for user in &subscribers {
                        check_user(&tx, "subscribers", *user)?;
                    }
                    if subscribers != task.subscribers {
                        task.subscribers = subscribers;
                        changed.push("subscribers");
                    }
                }
                if let Some(billable) = update.billable {
                    if billable != task.billable {
                        task.billable = billable;
                        changed.push("billable");
                    }
                }
                if let Some(pricing) = update.pricing {
                    if pricing != task.pricing {
                        task.pricing = pricing;
                        changed.push("pricing");
                    }
                }

                if !changed.is_empty() {
                    tx.put_task(task.clone())?;
                    tx.commit();
                    tracing::info!("updated {} ({}) by {}", id, changed.join(", "), actor.user_id);
                }
                Ok((task, changed))
            })
            .await?;

        let events = changed
            .into_iter()
            .map(|field| DomainEvent::TaskUpdated {
                project_id: task.project_id,
                task_id: task.id,
                field: field.to_owned(),
            })
            .collect();
        self.publish(events).await;
        Ok(task)
    }

    /// Mark a task complete or incomplete
    ///
    /// # Errors
    /// `NotFound` or `Unauthorized`.
    pub async fn complete_task(
        &self,
        actor: &Actor,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, DeckError> {
        let (task, changed) = self
            .bounded(async {
                let mut tx = self.store.begin();
                let mut task = active_task(&tx, id)?.clone();
                let project = project_row(&tx, task.project_id)?;
                self.check(&tx, actor, Action::Complete, Target::Task(&task, project))?;

                if completed == task.is_completed() {
                    return Ok((task, false));
                }
                task.completed_at = completed.then(Utc::now);
                tx.put_task(task.clone())?;
                tx.commit();
                tracing::info!("{} completed={} by {}", id, completed, actor.user_id);
                Ok((task, true))
            })
            .await?;

        if changed {
            self.publish(vec![DomainEvent::TaskUpdated {
                project_id: task.project_id,
                task_id: task.id,
                field: "completed_at".to_owned(),
            }])
            .await;
        }
        Ok(task)
    }

    /// Soft-archive a task
    ///
    /// # Errors
    /// `NotFound` or `Unauthorized`.
    pub async fn archive_task(&self, actor: &Actor, id: TaskId) -> Result<Task, DeckError> {
        let task = self
            .bounded(async {
                let mut tx = self.store.begin();
                let mut task = active_task(&tx, id)?.clone();
                let project = project_row(&tx, task.project_id)?;
                self.check(&tx, actor, Action::Archive, Target::Task(&task, project))?;

                task.archival.archive(Utc::now());
                tx.put_task(task.clone())?;
                tx.commit();
                tracing::info!("archived {} by {}", id, actor.user_id);
                Ok(task)
            })
            .await?;

        self.publish(vec![DomainEvent::TaskDeleted {
            project_id: task.project_id,
            task_id: task.id,
        }])
        .await;
        Ok(task)
    }

    /// Restore an archived task to the end of its group
    ///
    /// # Errors
    /// `NotFound` (also when the task is not archived) or `Unauthorized`.
    pub async fn restore_task(&self, actor: &Actor, id: TaskId) -> Result<Task, DeckError> {
        let task = self
            .bounded(async {
                let mut tx = self.store.begin();
                let mut task = task_row(&tx, id)?.clone();
                if task.archival.is_active() {
                    return Err(DeckError::not_found("archived task", id.get()));
                }
                let project = active_project(&tx, task.project_id)?;
                self.check(&tx, actor, Action::Restore, Target::Task(&task, project))?;

                if let Some(group) = task.group_id {
                    task.rank = next_rank(&tx, group);
                }
                task.archival.restore();
                tx.put_task(task.clone())?;
                tx.commit();
                tracing::info!("restored {} by {}", id, actor.user_id);
                Ok(task)
            })
            .await?;

        self.publish(vec![DomainEvent::TaskRestored {
            project_id: task.project_id,
            task_id: task.id,
        }])
        .await;
        Ok(task)
    }

    /// Rewrite the order of a group
    ///
    /// `ordered` lists every active task of the group the actor can see, as
    /// returned by [`list_tasks_for_group`](Self::list_tasks_for_group) with
    /// completed tasks included. Tasks outside that view keep their slots.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidOrderSet`, `ConcurrencyConflict`, `Timeout`.
    pub async fn reorder_tasks(
        &self,
        actor: &Actor,
        group: TaskGroupId,
        ordered: Vec<TaskId>,
        expected_version: Option<u64>,
    ) -> Result<OrderChange, DeckError> {
        self.authorize_group(actor, group)?;
        let visibility = self.authorize_tasks(actor, &ordered)?;
        let visible = move |t: &Task| visibility.admits(t);
        let request = ReorderRequest {
            group_id: group,
            ordered,
            expected_version,
        };
        let change = self
            .bounded(async {
                Ok(self
                    .ordering
                    .reorder_visible(&self.store, request, &visible)
                    .await?)
            })
            .await?;
        self.publish(vec![change.event.clone()]).await;
        Ok(change)
    }

    /// Move tasks between groups; `ordered` is the destination's new order
    ///
    /// # Errors
    /// As [`reorder_tasks`](Self::reorder_tasks).
    pub async fn move_tasks(
        &self,
        actor: &Actor,
        from_group: TaskGroupId,
        to_group: TaskGroupId,
        ordered: Vec<TaskId>,
        expected_version: Option<u64>,
    ) -> Result<OrderChange, DeckError> {
        self.authorize_group(actor, from_group)?;
        self.authorize_group(actor, to_group)?;
        let visibility = self.authorize_tasks(actor, &ordered)?;
        let visible = move |t: &Task| visibility.admits(t);
        let request = MoveRequest {
            from_group,
            to_group,
            ordered,
            expected_version,
        };
        let change = self
            .bounded(async {
                Ok(self
                    .ordering
                    .move_tasks_visible(&self.store, request, &visible)
                    .await?)
            })
            .await?;
        self.publish(vec![change.event.clone()]).await;
        Ok(change)
    }

    /// Move one task to position `to_index` of `to_group`
    ///
    /// `to_index` counts the destination tasks the actor can see.
    ///
    /// # Errors
    /// As [`reorder_tasks`](Self::reorder_tasks).
    pub async fn move_task(
        &self,
        actor: &Actor,
        task: TaskId,
        from_group: TaskGroupId,
        to_group: TaskGroupId,
        to_index: usize,
    ) -> Result<OrderChange, DeckError> {
        self.authorize_group(actor, from_group)?;
        self.authorize_group(actor, to_group)?;
        let visibility = self.authorize_tasks(actor, &[task])?;
        let visible = move |t: &Task| visibility.admits(t);
        let change = self
            .bounded(async {
                Ok(self
                    .ordering
                    .move_task_visible(&self.store, task, from_group, to_group, to_index, &visible)
                    .await?)
            })
            .await?;
        self.publish(vec![change.event.clone()]).await;
        Ok(change)
    }

    fn authorize_group(&self, actor: &Actor, group: TaskGroupId) -> Result<(), DeckError> {
        let tables = self.store.read();
        let project = group_project(&tables, group)?;
        let project = active_project(&tables, project)?;
        self.check(&tables, actor, Action::Reorder, Target::Project(project))?;
        Ok(())
    }

    /// Refuse to order any listed task the actor cannot see
    fn authorize_tasks(&self, actor: &Actor, ids: &[TaskId]) -> Result<TaskVisibility, DeckError> {
        let visibility = TaskVisibility::for_actor(actor);
        if visibility.sees_all() {
            return Ok(visibility);
        }
        let tables = self.store.read();
        let hidden = ids
            .iter()
            .filter_map(|id| tables.task(*id))
            .find(|task| !visibility.admits(task));
        match hidden {
            Some(task) => {
                tracing::warn!("denied reorder of hidden {} for {}", task.id, actor.user_id);
                Err(DeckError::Unauthorized {
                    action: Action::Reorder,
                    reason: DenyReason::TaskRule {
                        task: task.id,
                        rule: "task is not visible to this user",
                    },
                })
            }
            None => Ok(visibility),
        }
    }
}

fn group_project(tables: &Tables, group: TaskGroupId) -> Result<ProjectId, DeckError> {
    tables
        .group(group)
        .map(|g| g.project_id)
        .ok_or_else(|| DeckError::not_found("task group", group.get()))
}

/// Rank after the last active task of `group`
fn next_rank(tables: &Tables, group: TaskGroupId) -> u32 {
    tables
        .group_tasks(group, ArchiveFilter::Active)
        .last()
        .map_or(0, |t| t.rank.saturating_add(1))
}

fn check_user(tables: &Tables, field: &str, user: UserId) -> Result<(), DeckError> {
    if tables.user(user).is_some_and(|u| u.archival.is_active()) {
        Ok(())
    } else {
        Err(DeckError::field(field, format!("{user} does not exist")))
    }
}

fn check_labels(tables: &Tables, labels: &BTreeSet<LabelId>) -> Result<(), DeckError> {
    match labels.iter().find(|id| tables.label(**id).is_none()) {
        Some(missing) => Err(DeckError::field("labels", format!("{missing} does not exist"))),
        None => Ok(()),
    }
}
