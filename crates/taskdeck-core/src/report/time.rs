//! Logged-time and fixed-price sums

use super::{ReportContext, TimeFilters};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use taskdeck_model::{ClientCompanyId, Project, ProjectId, Task, TimeLog, UserId};

/// Minutes to hours, unrounded
#[allow(clippy::cast_precision_loss)]
fn hours(minutes: u64) -> f64 {
    minutes as f64 / 60.0
}

/// Logged time of one user on one project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedTimeRow {
    pub project_id: ProjectId,
    pub project_name: String,
    /// Minor currency units per hour
    pub project_rate: Option<u64>,
    pub client_company_id: Option<ClientCompanyId>,
    pub user_id: UserId,
    pub user_name: String,
    pub user_rate: Option<u64>,
    pub minutes: u64,
    pub hours: f64,
}

/// Logged time of one user on one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLoggedTimeRow {
    pub date: NaiveDate,
    pub user_id: UserId,
    pub user_name: String,
    pub minutes: u64,
    pub hours: f64,
}

/// Fixed-price total of one assignee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedPriceRow {
    pub user_id: UserId,
    pub user_name: String,
    /// Minor currency units
    pub total_fixed_price: u64,
    pub total_tasks: u32,
}

/// Time logs passing `filters`, with their task and project
fn matching_logs<'a>(
    ctx: &'a ReportContext<'a>,
    filters: &'a TimeFilters,
) -> impl Iterator<Item = (&'a TimeLog, &'a Task, &'a Project)> + 'a {
    let period = ctx.period(filters);
    ctx.tables.time_logs().filter_map(move |log| {
        if log.billable != filters.billable
            || !filters.admits_user(log.user_id)
            || !period.contains(log.created_at)
        {
            return None;
        }
        let task = ctx.tables.task(log.task_id)?;
        if !task.archival.is_active()
            || !ctx.scope.admits_task(task)
            || !filters.admits_project(task.project_id)
            || !filters.admits_completion(task)
        {
            return None;
        }
        let project = ctx.project(task.project_id)?;
        Some((log, task, project))
    })
}

pub(super) fn logged_time_sum(ctx: &ReportContext<'_>, filters: &TimeFilters) -> Vec<LoggedTimeRow> {
    let mut sums: BTreeMap<(ProjectId, UserId), (&Project, u64)> = BTreeMap::new();
    for (log, _, project) in matching_logs(ctx, filters) {
        sums.entry((project.id, log.user_id)).or_insert((project, 0)).1 += u64::from(log.minutes);
    }

    let mut rows: Vec<LoggedTimeRow> = sums
        .into_iter()
        .map(|((_, user_id), (project, minutes))| {
            let user = ctx.tables.user(user_id);
            LoggedTimeRow {
                project_id: project.id,
                project_name: project.name.clone(),
                project_rate: project.rate,
                client_company_id: project.client_company_id,
                user_id,
                user_name: ctx.user_name(user_id),
                user_rate: user.and_then(|u| u.rate),
                minutes,
                hours: hours(minutes),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        a.project_name
            .cmp(&b.project_name)
            .then_with(|| a.user_name.cmp(&b.user_name))
            .then(a.project_id.cmp(&b.project_id))
            .then(a.user_id.cmp(&b.user_id))
    });
    rows
}

pub(super) fn daily_logged_time(
    ctx: &ReportContext<'_>,
    filters: &TimeFilters,
) -> Vec<DailyLoggedTimeRow> {
    let mut sums: BTreeMap<(NaiveDate, UserId), u64> = BTreeMap::new();
    for (log, _, _) in matching_logs(ctx, filters) {
        *sums.entry((log.created_at.date_naive(), log.user_id)).or_default() += u64::from(log.minutes);
    }

    let mut rows: Vec<DailyLoggedTimeRow> = sums
        .into_iter()
        .map(|((date, user_id), minutes)| DailyLoggedTimeRow {
            date,
            user_id,
            user_name: ctx.user_name(user_id),
            minutes,
            hours: hours(minutes),
        })
        .collect();
    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.user_name.cmp(&b.user_name))
            .then(a.user_id.cmp(&b.user_id))
    });
    rows
}

pub(super) fn fixed_price_sum(ctx: &ReportContext<'_>, filters: &TimeFilters) -> Vec<FixedPriceRow> {
    let period = ctx.period(filters);
    let mut sums: BTreeMap<UserId, (u64, u32)> = BTreeMap::new();

    for (task, project) in ctx.tasks() {
        let Some(amount) = task.fixed_price() else {
            continue;
        };
        let Some(assignee) = task.assigned_to else {
            continue;
        };
        // completed tasks are dated by completion, open ones by creation
        let dated = if filters.completed {
            task.completed_at
        } else {
            Some(task.created_at)
        };
        if task.billable != filters.billable
            || !filters.admits_completion(task)
            || !filters.admits_project(project.id)
            || !filters.admits_user(assignee)
            || !dated.is_some_and(|at| period.contains(at))
        {
            continue;
        }
        let entry = sums.entry(assignee).or_default();
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut rows: Vec<FixedPriceRow> = sums
        .into_iter()
        .map(|(user_id, (total_fixed_price, total_tasks))| FixedPriceRow {
            user_id,
            user_name: ctx.user_name(user_id),
            total_fixed_price,
            total_tasks,
        })
        .collect();
    rows.sort_by(|a, b| a.user_name.cmp(&b.user_name).then(a.user_id.cmp(&b.user_id)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_are_not_rounded() {
        assert!((hours(50) - 50.0 / 60.0).abs() < f64::EPSILON);
        assert!((hours(90) - 1.5).abs() < f64::EPSILON);
        assert!(hours(0).abs() < f64::EPSILON);
    }
}
