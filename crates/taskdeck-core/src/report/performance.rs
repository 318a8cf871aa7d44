//! Work statistics and completion performance

use super::ReportContext;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use taskdeck_model::{ProjectId, Role, TeamId, UserId};

/// Completion rate bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceStatus {
    Good,
    Average,
    Poor,
}

impl PerformanceStatus {
    /// `Good` from 80, `Average` from 50, `Poor` below
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 80.0 {
            PerformanceStatus::Good
        } else if rate >= 50.0 {
            PerformanceStatus::Average
        } else {
            PerformanceStatus::Poor
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PerformanceStatus::Good => "Good",
            PerformanceStatus::Average => "Average",
            PerformanceStatus::Poor => "Poor",
        })
    }
}

/// `completed / assigned * 100`, two decimals; 0 when nothing is assigned
#[must_use]
pub fn completion_rate(completed: u32, assigned: u32) -> f64 {
    if assigned == 0 {
        return 0.0;
    }
    let rate = f64::from(completed) / f64::from(assigned) * 100.0;
    (rate * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Completed,
    Incomplete,
}

/// One task in the status chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub project: String,
    pub task: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkTotals {
    pub completed_tasks: u32,
    pub incomplete_tasks: u32,
    pub total_projects: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPerformance {
    pub team_id: TeamId,
    pub team: String,
    pub assigned_tasks: u32,
    pub completed_tasks: u32,
    pub completion_rate: f64,
    pub status: PerformanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualPerformance {
    pub user_id: UserId,
    pub name: String,
    pub assigned_tasks: u32,
    pub completed_tasks: u32,
    pub completion_rate: f64,
    pub status: PerformanceStatus,
}

/// Work statistics report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkStatistics {
    pub statistics: WorkTotals,
    pub chart: Vec<ChartRow>,
    pub team_performance: Vec<TeamPerformance>,
    /// Highest completion rate first
    pub individual_performance: Vec<IndividualPerformance>,
}

/// (assigned, completed) counters
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    assigned: u32,
    completed: u32,
}

impl Tally {
    fn add(&mut self, other: Tally) {
        self.assigned += other.assigned;
        self.completed += other.completed;
    }

    fn rate(self) -> (f64, PerformanceStatus) {
        let rate = completion_rate(self.completed, self.assigned);
        (rate, PerformanceStatus::from_rate(rate))
    }
}

pub(super) fn compute(ctx: &ReportContext<'_>) -> WorkStatistics {
    let mut chart = Vec::new();
    let mut totals = WorkTotals {
        completed_tasks: 0,
        incomplete_tasks: 0,
        total_projects: 0,
    };
    let mut with_tasks: BTreeSet<ProjectId> = BTreeSet::new();
    let mut by_assignee: BTreeMap<UserId, Tally> = BTreeMap::new();

    for (task, project) in ctx.tasks() {
        with_tasks.insert(project.id);
        let done = task.completed_at.is_some();
        if done {
            totals.completed_tasks += 1;
        } else {
            totals.incomplete_tasks += 1;
        }
        chart.push(ChartRow {
            project: project.name.clone(),
            task: task.name.clone(),
            status: if done {
                TaskStatus::Completed
            } else {
                TaskStatus::Incomplete
            },
        });
        if let Some(assignee) = task.assigned_to {
            let tally = by_assignee.entry(assignee).or_default();
            tally.assigned += 1;
            if done {
                tally.completed += 1;
            }
        }
    }

    // unrestricted viewers count every project, others only projects with visible work
    let projects = if ctx.scope.visibility().sees_all() {
        ctx.tables.projects().filter(|p| ctx.project(p.id).is_some()).count()
    } else {
        with_tasks.len()
    };
    totals.total_projects = u32::try_from(projects).unwrap_or(u32::MAX);

    let tally_of = |user: UserId| by_assignee.get(&user).copied().unwrap_or_default();

    let team_performance = ctx
        .tables
        .teams()
        .map(|team| {
            let mut tally = Tally::default();
            for member in &team.members {
                tally.add(tally_of(*member));
            }
            let (completion_rate, status) = tally.rate();
            TeamPerformance {
                team_id: team.id,
                team: team.name.clone(),
                assigned_tasks: tally.assigned,
                completed_tasks: tally.completed,
                completion_rate,
                status,
            }
        })
        .collect();

    let mut individual_performance: Vec<IndividualPerformance> = ctx
        .tables
        .users()
        .filter(|u| u.archival.is_active())
        .filter(|u| u.roles.contains(&Role::TeamLeader) || !ctx.tables.teams_of(u.id).is_empty())
        .map(|user| {
            let tally = tally_of(user.id);
            let (completion_rate, status) = tally.rate();
            IndividualPerformance {
                user_id: user.id,
                name: user.name.clone(),
                assigned_tasks: tally.assigned,
                completed_tasks: tally.completed,
                completion_rate,
                status,
            }
        })
        .collect();
    individual_performance.sort_by(|a, b| {
        b.completion_rate
            .partial_cmp(&a.completion_rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
            .then(a.user_id.cmp(&b.user_id))
    });

    WorkStatistics {
        statistics: totals,
        chart,
        team_performance,
        individual_performance,
    }
}
