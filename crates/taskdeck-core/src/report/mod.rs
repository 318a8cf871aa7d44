//! Reporting Aggregator
//!
//! Read-only figures derived from tasks, comments and time logs. Every
//! report is computed over the actor's [`ProjectScope`]: rows outside the
//! scope are dropped before any aggregation sees them, so a report never
//! computes privileged figures and then hides them.
//!
//! Archived projects and tasks are left out of every report.
//!
//! # Example
//!
//! ```ignore
//! let request = ReportRequest::new(ReportKind::LoggedTimeSum)
//!     .with_filters(TimeFilters::default().with_billable(false));
//! let report = deck.compute_report(&actor, &request)?;
//! ```

mod dashboard;
mod performance;
mod time;

pub use dashboard::{AssignedTask, Dashboard, OverdueTask, ProjectFunnel, RecentComment};
pub use performance::{
    completion_rate, ChartRow, IndividualPerformance, PerformanceStatus, TaskStatus,
    TeamPerformance, WorkStatistics, WorkTotals,
};
pub use time::{DailyLoggedTimeRow, FixedPriceRow, LoggedTimeRow};

use crate::deck::TaskDeck;
use crate::error::DeckError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use taskdeck_model::{Permission, Project, ProjectId, Task, UserId};
use taskdeck_policy::{Action, Actor, ProjectScope};
use taskdeck_store::Tables;

/// Report kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Dashboard,
    LoggedTimeSum,
    DailyLoggedTime,
    FixedPriceSum,
    WorkStatistics,
}

impl ReportKind {
    /// Every kind
    pub const ALL: [ReportKind; 5] = [
        ReportKind::Dashboard,
        ReportKind::LoggedTimeSum,
        ReportKind::DailyLoggedTime,
        ReportKind::FixedPriceSum,
        ReportKind::WorkStatistics,
    ];

    /// Permission required to view this report
    #[must_use]
    pub fn permission(self) -> Permission {
        match self {
            ReportKind::Dashboard => Permission::ViewProjects,
            ReportKind::LoggedTimeSum => Permission::ViewLoggedTimeSumReport,
            ReportKind::DailyLoggedTime => Permission::ViewDailyLoggedTimeReport,
            ReportKind::FixedPriceSum => Permission::ViewFixedPriceSumReport,
            ReportKind::WorkStatistics => Permission::ViewWorkStatisticsReport,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Dashboard => "dashboard",
            ReportKind::LoggedTimeSum => "logged_time_sum",
            ReportKind::DailyLoggedTime => "daily_logged_time",
            ReportKind::FixedPriceSum => "fixed_price_sum",
            ReportKind::WorkStatistics => "work_statistics",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| DeckError::field("kind", format!("unknown report '{s}'")))
    }
}

/// Inclusive range of calendar days (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Range from `from` to `to`, both days included
    ///
    /// # Errors
    /// `Validation` when `to` precedes `from`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DeckError> {
        if to < from {
            return Err(DeckError::field("date_range", "end precedes start"));
        }
        Ok(Self { from, to })
    }
}

/// Filters shared by the time and price reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeFilters {
    /// Only these projects; `None` means every project in scope
    pub projects: Option<BTreeSet<ProjectId>>,
    /// Only these users (loggers, or assignees for fixed prices)
    pub users: Option<BTreeSet<UserId>>,
    /// Explicit range; `None` means the configured trailing window
    pub date_range: Option<DateRange>,
    /// Completed tasks when true, incomplete tasks when false
    pub completed: bool,
    pub billable: bool,
}

impl Default for TimeFilters {
    fn default() -> Self {
        Self {
            projects: None,
            users: None,
            date_range: None,
            completed: true,
            billable: true,
        }
    }
}

impl TimeFilters {
    #[inline]
    #[must_use]
    pub fn with_projects(mut self, projects: impl IntoIterator<Item = ProjectId>) -> Self {
        self.projects = Some(projects.into_iter().collect());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_users(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.users = Some(users.into_iter().collect());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_billable(mut self, billable: bool) -> Self {
        self.billable = billable;
        self
    }

    fn admits_project(&self, project: ProjectId) -> bool {
        self.projects.as_ref().map_or(true, |ids| ids.contains(&project))
    }

    fn admits_user(&self, user: UserId) -> bool {
        self.users.as_ref().map_or(true, |ids| ids.contains(&user))
    }

    fn admits_completion(&self, task: &Task) -> bool {
        task.completed_at.is_some() == self.completed
    }
}

/// Report to compute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub kind: ReportKind,
    #[serde(default)]
    pub filters: TimeFilters,
}

impl ReportRequest {
    /// Request with default filters
    #[must_use]
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            filters: TimeFilters::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_filters(mut self, filters: TimeFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// Computed report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Report {
    Dashboard(Dashboard),
    LoggedTimeSum(Vec<LoggedTimeRow>),
    DailyLoggedTime(Vec<DailyLoggedTimeRow>),
    FixedPriceSum(Vec<FixedPriceRow>),
    WorkStatistics(WorkStatistics),
}

impl Report {
    #[must_use]
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Dashboard(_) => ReportKind::Dashboard,
            Report::LoggedTimeSum(_) => ReportKind::LoggedTimeSum,
            Report::DailyLoggedTime(_) => ReportKind::DailyLoggedTime,
            Report::FixedPriceSum(_) => ReportKind::FixedPriceSum,
            Report::WorkStatistics(_) => ReportKind::WorkStatistics,
        }
    }
}

/// Time span a timestamp filter admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Period {
    /// Strictly after the instant
    Since(DateTime<Utc>),
    /// Half-open `[start, end)`
    Between(DateTime<Utc>, DateTime<Utc>),
}

impl Period {
    pub(crate) fn resolve(range: Option<DateRange>, now: DateTime<Utc>, window_days: u32) -> Self {
        match range {
            Some(range) => {
                let end = range.to.succ_opt().unwrap_or(range.to);
                Period::Between(start_of_day(range.from), start_of_day(end))
            }
            None => Period::Since(
                now.checked_sub_signed(Duration::days(i64::from(window_days)))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
        }
    }

    pub(crate) fn contains(self, at: DateTime<Utc>) -> bool {
        match self {
            Period::Since(start) => at > start,
            Period::Between(start, end) => at >= start && at < end,
        }
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Everything a report body reads: one consistent snapshot and one scope
pub(crate) struct ReportContext<'a> {
    pub(crate) tables: &'a Tables,
    pub(crate) scope: &'a ProjectScope,
    pub(crate) actor: &'a Actor,
    pub(crate) now: DateTime<Utc>,
    pub(crate) window_days: u32,
}

impl<'a> ReportContext<'a> {
    /// Active project in scope
    pub(crate) fn project(&self, id: ProjectId) -> Option<&'a Project> {
        self.tables
            .project(id)
            .filter(|p| p.archival.is_active() && self.scope.admits_project(p.id))
    }

    /// Active tasks of active in-scope projects visible to the actor
    pub(crate) fn tasks(&self) -> impl Iterator<Item = (&'a Task, &'a Project)> + '_ {
        self.tables.tasks().filter_map(move |task| {
            if !task.archival.is_active() || !self.scope.admits_task(task) {
                return None;
            }
            self.project(task.project_id).map(|project| (task, project))
        })
    }

    pub(crate) fn period(&self, filters: &TimeFilters) -> Period {
        Period::resolve(filters.date_range, self.now, self.window_days)
    }

    pub(crate) fn user_name(&self, id: UserId) -> String {
        self.tables
            .user(id)
            .map_or_else(|| id.to_string(), |u| u.name.clone())
    }
}

impl TaskDeck {
    /// Compute a report as of now
    ///
    /// # Errors
    /// `Unauthorized` without the report's permission, `Validation` for
    /// inconsistent filters.
    pub fn compute_report(&self, actor: &Actor, request: &ReportRequest) -> Result<Report, DeckError> {
        self.compute_report_at(actor, request, Utc::now())
    }

    /// Compute a report as of `now`
    ///
    /// `now` anchors the default time window and the overdue check.
    ///
    /// # Errors
    /// See [`TaskDeck::compute_report`].
    pub fn compute_report_at(
        &self,
        actor: &Actor,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> Result<Report, DeckError> {
        self.require(actor, Action::View, request.kind.permission())?;
        if let Some(range) = request.filters.date_range {
            DateRange::new(range.from, range.to)?;
        }

        let tables = self.store.read();
        let scope = self.scope_in(&tables, actor);
        let ctx = ReportContext {
            tables: &tables,
            scope: &scope,
            actor,
            now,
            window_days: self.config.report_window_days,
        };
        let filters = &request.filters;

        let report = match request.kind {
            ReportKind::Dashboard => Report::Dashboard(dashboard::compute(&ctx)),
            ReportKind::LoggedTimeSum => Report::LoggedTimeSum(time::logged_time_sum(&ctx, filters)),
            ReportKind::DailyLoggedTime => {
                Report::DailyLoggedTime(time::daily_logged_time(&ctx, filters))
            }
            ReportKind::FixedPriceSum => Report::FixedPriceSum(time::fixed_price_sum(&ctx, filters)),
            ReportKind::WorkStatistics => Report::WorkStatistics(performance::compute(&ctx)),
        };
        tracing::debug!("computed {} report for {}", request.kind, actor.user_id);
        Ok(report)
    }
}
