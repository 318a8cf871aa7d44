//! Dashboard cards

use super::ReportContext;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use taskdeck_model::{
    ClientCompanyId, CommentId, Project, ProjectId, Task, TaskGroupId, TaskId, UserId,
};

/// Recently assigned tasks shown on the dashboard
const RECENT_ASSIGNMENTS: usize = 10;

/// Completion funnel of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectFunnel {
    pub project_id: ProjectId,
    pub name: String,
    pub client_company_id: Option<ClientCompanyId>,
    pub favorite: bool,
    pub total: u32,
    pub completed: u32,
    /// Due before today and not completed
    pub overdue: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueTask {
    pub task_id: TaskId,
    pub name: String,
    pub due_on: NaiveDate,
    pub project_id: ProjectId,
    pub project_name: String,
    pub group_id: Option<TaskGroupId>,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedTask {
    pub task_id: TaskId,
    pub name: String,
    pub assigned_at: DateTime<Utc>,
    pub project_id: ProjectId,
    pub project_name: String,
    pub group_id: Option<TaskGroupId>,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentComment {
    pub comment_id: CommentId,
    pub task_id: TaskId,
    pub task_name: String,
    pub project_name: String,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Dashboard for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Favorites first, then by name
    pub projects: Vec<ProjectFunnel>,
    /// Earliest due date first
    pub overdue_tasks: Vec<OverdueTask>,
    /// Incomplete tasks assigned to the user, newest assignment first
    pub recently_assigned: Vec<AssignedTask>,
    /// Comments on the user's assigned tasks, newest first
    pub recent_comments: Vec<RecentComment>,
}

pub(super) fn compute(ctx: &ReportContext<'_>) -> Dashboard {
    let today = ctx.now.date_naive();
    let me = ctx.actor.user_id;
    let group_name = |task: &Task| {
        task.group_id
            .and_then(|id| ctx.tables.group(id))
            .map(|g| g.name.clone())
    };

    let mut funnels: BTreeMap<ProjectId, ProjectFunnel> = ctx
        .tables
        .projects()
        .filter_map(|p| ctx.project(p.id))
        .map(|p| (p.id, funnel_of(ctx, p)))
        .collect();

    let mut overdue_tasks = Vec::new();
    let mut recently_assigned = Vec::new();
    let mut mine = Vec::new();

    for (task, project) in ctx.tasks() {
        if let Some(funnel) = funnels.get_mut(&project.id) {
            funnel.total += 1;
            if task.completed_at.is_some() {
                funnel.completed += 1;
            }
            if task.is_overdue(today) {
                funnel.overdue += 1;
            }
        }
        if let (true, Some(due_on)) = (task.is_overdue(today), task.due_on) {
            overdue_tasks.push(OverdueTask {
                task_id: task.id,
                name: task.name.clone(),
                due_on,
                project_id: project.id,
                project_name: project.name.clone(),
                group_id: task.group_id,
                group_name: group_name(task),
            });
        }
        if task.assigned_to == Some(me) {
            mine.push((task, project));
            if let (None, Some(assigned_at)) = (task.completed_at, task.assigned_at) {
                recently_assigned.push(AssignedTask {
                    task_id: task.id,
                    name: task.name.clone(),
                    assigned_at,
                    project_id: project.id,
                    project_name: project.name.clone(),
                    group_id: task.group_id,
                    group_name: group_name(task),
                });
            }
        }
    }

    overdue_tasks.sort_by(|a, b| a.due_on.cmp(&b.due_on).then(a.task_id.cmp(&b.task_id)));
    recently_assigned.sort_by(|a, b| {
        b.assigned_at
            .cmp(&a.assigned_at)
            .then(a.task_id.cmp(&b.task_id))
    });
    recently_assigned.truncate(RECENT_ASSIGNMENTS);

    let mut recent_comments: Vec<RecentComment> = mine
        .into_iter()
        .flat_map(|(task, project)| {
            ctx.tables
                .comments_of(task.id)
                .into_iter()
                .map(move |c| RecentComment {
                    comment_id: c.id,
                    task_id: task.id,
                    task_name: task.name.clone(),
                    project_name: project.name.clone(),
                    author_id: c.author_id,
                    author_name: ctx.user_name(c.author_id),
                    content: c.content.clone(),
                    created_at: c.created_at,
                })
        })
        .collect();
    recent_comments.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then(b.comment_id.cmp(&a.comment_id))
    });

    let mut projects: Vec<ProjectFunnel> = funnels.into_values().collect();
    projects.sort_by(|a, b| {
        b.favorite
            .cmp(&a.favorite)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then(a.project_id.cmp(&b.project_id))
    });

    Dashboard {
        projects,
        overdue_tasks,
        recently_assigned,
        recent_comments,
    }
}

fn funnel_of(ctx: &ReportContext<'_>, project: &Project) -> ProjectFunnel {
    ProjectFunnel {
        project_id: project.id,
        name: project.name.clone(),
        client_company_id: project.client_company_id,
        favorite: ctx.tables.is_favorite(ctx.actor.user_id, project.id),
        total: 0,
        completed: 0,
        overdue: 0,
    }
}
