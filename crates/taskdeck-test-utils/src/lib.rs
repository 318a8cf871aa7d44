//! Testing utilities for the Taskdeck workspace
//!
//! A small seeded organization shared by integration tests:
//!
//! | user | roles | team | grants |
//! |------|-------|------|--------|
//! | Ada  | admin | | |
//! | Lee  | team leader | Platform | Apollo |
//! | Mia  | developer | Platform | Apollo |
//! | Noor | designer | Platform | Borealis |
//! | Cal  | client (Acme) | | |
//! | Zed  | qa engineer | | Cygnus |
//! | Tia  | team leader | Platform | |
//!
//! Apollo and Cygnus belong to Acme, Borealis to Globex. Every timestamp is
//! derived from [`epoch`].

#![allow(missing_docs)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use taskdeck_model::{
    Archival, ClientCompany, ClientCompanyId, Comment, CommentId, Label, LabelId, Pricing,
    Project, ProjectId, Role, Task, TaskGroup, TaskGroupId, TaskId, Team, TeamId, TimeLog,
    TimeLogId, User, UserId, DEFAULT_LABELS,
};
use taskdeck_store::{Grant, MemoryStore, Snapshot};

pub const ADA: UserId = UserId(1);
pub const LEE: UserId = UserId(2);
pub const MIA: UserId = UserId(3);
pub const NOOR: UserId = UserId(4);
pub const CAL: UserId = UserId(5);
pub const ZED: UserId = UserId(6);
pub const TIA: UserId = UserId(7);

pub const PLATFORM: TeamId = TeamId(20);

pub const ACME: ClientCompanyId = ClientCompanyId(30);
pub const GLOBEX: ClientCompanyId = ClientCompanyId(31);

pub const APOLLO: ProjectId = ProjectId(40);
pub const BOREALIS: ProjectId = ProjectId(41);
pub const CYGNUS: ProjectId = ProjectId(42);

pub const APOLLO_BACKLOG: TaskGroupId = TaskGroupId(50);
pub const APOLLO_DOING: TaskGroupId = TaskGroupId(51);
pub const APOLLO_DONE: TaskGroupId = TaskGroupId(52);
pub const BOREALIS_BACKLOG: TaskGroupId = TaskGroupId(53);
pub const CYGNUS_BACKLOG: TaskGroupId = TaskGroupId(56);

/// Backlog, Lee -> Mia, overdue, Cal subscribed
pub const SCHEMA: TaskId = TaskId(60);
/// Backlog, Lee -> Noor
pub const API: TaskId = TaskId(61);
/// Backlog, Ada -> Mia, completed
pub const REVIEW: TaskId = TaskId(62);
/// Doing, Lee -> Mia
pub const DEPLOY: TaskId = TaskId(63);
/// Borealis backlog, Ada -> Noor, completed, fixed price
pub const KICKOFF: TaskId = TaskId(64);
/// Cygnus backlog, Ada -> Zed
pub const AUDIT: TaskId = TaskId(65);

pub const LABEL_COMPLETED: LabelId = LabelId(70);

/// Fixed price of [`KICKOFF`], minor units
pub const KICKOFF_PRICE: u64 = 50_000;

/// Reference instant of the fixture: 2026-03-02 09:00 UTC
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn user(id: UserId, name: &str, role: Role) -> User {
    User::new(id, name, format!("{}@example.com", name.to_lowercase())).with_role(role)
}

fn groups(project: ProjectId, first: u64) -> Vec<TaskGroup> {
    ["Backlog", "In Progress", "Done"]
        .into_iter()
        .zip(0u32..)
        .map(|(name, pos)| TaskGroup::new(TaskGroupId(first + u64::from(pos)), project, name, pos))
        .collect()
}

fn task(
    id: TaskId,
    project: ProjectId,
    group: TaskGroupId,
    rank: u32,
    name: &str,
    created_by: UserId,
    assigned_to: UserId,
) -> Task {
    let mut task = Task::new(id, project, Some(group), name, created_by, epoch() - Duration::days(3));
    task.rank = rank;
    task.assigned_to = Some(assigned_to);
    // later ids were assigned later
    let offset = Duration::minutes(i64::try_from(id.get()).unwrap_or(0));
    task.assigned_at = Some(epoch() - Duration::days(3) + offset);
    task
}

/// The seeded organization as a snapshot
#[must_use]
pub fn seeded_snapshot() -> Snapshot {
    let now = epoch();

    let users = vec![
        user(ADA, "Ada", Role::Admin),
        user(LEE, "Lee", Role::TeamLeader),
        user(MIA, "Mia", Role::Developer),
        user(NOOR, "Noor", Role::Designer),
        user(CAL, "Cal", Role::Client).with_company(ACME),
        user(ZED, "Zed", Role::QaEngineer),
        user(TIA, "Tia", Role::TeamLeader),
    ];

    let teams = vec![Team::new(PLATFORM, "Platform")
        .with_member(LEE)
        .with_member(MIA)
        .with_member(NOOR)
        .with_member(TIA)];

    let companies = vec![
        ClientCompany {
            id: ACME,
            name: "Acme".into(),
        },
        ClientCompany {
            id: GLOBEX,
            name: "Globex".into(),
        },
    ];

    let projects = vec![
        Project::new(APOLLO, "Apollo", now - Duration::days(30)).with_company(ACME),
        Project::new(BOREALIS, "Borealis", now - Duration::days(20)).with_company(GLOBEX),
        Project::new(CYGNUS, "Cygnus", now - Duration::days(10)).with_company(ACME),
    ];

    let mut all_groups = groups(APOLLO, APOLLO_BACKLOG.get());
    all_groups.extend(groups(BOREALIS, BOREALIS_BACKLOG.get()));
    all_groups.extend(groups(CYGNUS, CYGNUS_BACKLOG.get()));

    let mut schema = task(SCHEMA, APOLLO, APOLLO_BACKLOG, 0, "Design schema", LEE, MIA);
    schema.due_on = Some(day(2026, 2, 20));
    schema.subscribers.insert(CAL);
    let api = task(API, APOLLO, APOLLO_BACKLOG, 1, "Write API", LEE, NOOR);
    let mut review = task(REVIEW, APOLLO, APOLLO_BACKLOG, 2, "Review PR", ADA, MIA);
    review.completed_at = Some(now - Duration::hours(2));
    review.labels.insert(LABEL_COMPLETED);
    let deploy = task(DEPLOY, APOLLO, APOLLO_DOING, 0, "Deploy", LEE, MIA);
    let mut kickoff = task(KICKOFF, BOREALIS, BOREALIS_BACKLOG, 0, "Kickoff", ADA, NOOR);
    kickoff.completed_at = Some(now - Duration::days(1));
    kickoff.pricing = Pricing::Fixed {
        amount: KICKOFF_PRICE,
    };
    let audit = task(AUDIT, CYGNUS, CYGNUS_BACKLOG, 0, "Audit", ADA, ZED);

    let labels = DEFAULT_LABELS
        .iter()
        .zip(LABEL_COMPLETED.get()..)
        .map(|((name, color), id)| Label {
            id: LabelId(id),
            name: (*name).to_owned(),
            color: (*color).to_owned(),
            archival: Archival::active(),
        })
        .collect();

    let comments = vec![
        Comment {
            id: CommentId(75),
            task_id: SCHEMA,
            author_id: LEE,
            content: "Use the v2 layout".into(),
            created_at: now - Duration::hours(5),
        },
        Comment {
            id: CommentId(76),
            task_id: DEPLOY,
            author_id: ADA,
            content: "Blocked on review".into(),
            created_at: now - Duration::hours(1),
        },
    ];

    let time_logs = vec![
        TimeLog {
            id: TimeLogId(80),
            task_id: REVIEW,
            user_id: MIA,
            minutes: 90,
            billable: true,
            created_at: now - Duration::days(1),
        },
        TimeLog {
            id: TimeLogId(81),
            task_id: REVIEW,
            user_id: MIA,
            minutes: 50,
            billable: true,
            created_at: now - Duration::hours(3),
        },
        TimeLog {
            id: TimeLogId(82),
            task_id: KICKOFF,
            user_id: NOOR,
            minutes: 30,
            billable: true,
            created_at: now - Duration::days(1),
        },
        TimeLog {
            id: TimeLogId(83),
            task_id: SCHEMA,
            user_id: MIA,
            minutes: 45,
            billable: true,
            created_at: now - Duration::days(1),
        },
        TimeLog {
            id: TimeLogId(84),
            task_id: REVIEW,
            user_id: LEE,
            minutes: 20,
            billable: false,
            created_at: now - Duration::days(1),
        },
    ];

    let grants = vec![
        Grant {
            project_id: APOLLO,
            user_id: LEE,
        },
        Grant {
            project_id: APOLLO,
            user_id: MIA,
        },
        Grant {
            project_id: BOREALIS,
            user_id: NOOR,
        },
        Grant {
            project_id: CYGNUS,
            user_id: ZED,
        },
    ];

    Snapshot {
        users,
        teams,
        companies,
        projects,
        groups: all_groups,
        tasks: vec![schema, api, review, deploy, kickoff, audit],
        labels,
        comments,
        time_logs,
        grants,
        favorites: Vec::new(),
    }
}

/// Store loaded with [`seeded_snapshot`]
///
/// # Panics
/// If the fixture itself is inconsistent.
#[must_use]
pub fn seeded_store() -> Arc<MemoryStore> {
    match MemoryStore::from_snapshot(seeded_snapshot()) {
        Ok(store) => Arc::new(store),
        Err(err) => panic!("seeded fixture is inconsistent: {err}"),
    }
}

/// Ids of a group's active tasks in rank order
#[must_use]
pub fn group_order(store: &MemoryStore, group: TaskGroupId) -> Vec<TaskId> {
    store.read().group_order(group)
}
