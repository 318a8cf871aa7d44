//! Table storage and read queries

use crate::error::StoreError;
use crate::snapshot::{Favorite, Grant, Snapshot};
use std::collections::{BTreeMap, BTreeSet};
use taskdeck_model::{
    ArchiveFilter, ClientCompany, ClientCompanyId, Comment, CommentId, Label, LabelId, Project,
    ProjectId, Role, Task, TaskGroup, TaskGroupId, TaskId, Team, TeamId, TimeLog, TimeLogId, User,
    UserId,
};
use taskdeck_policy::AccessFacts;

/// Every table of the board
///
/// Reads go through the query methods; writes only through
/// [`Transaction`](crate::Transaction), which records undo entries.
#[derive(Debug, Default)]
pub struct Tables {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) teams: BTreeMap<TeamId, Team>,
    pub(crate) companies: BTreeMap<ClientCompanyId, ClientCompany>,
    pub(crate) projects: BTreeMap<ProjectId, Project>,
    pub(crate) groups: BTreeMap<TaskGroupId, TaskGroup>,
    pub(crate) tasks: BTreeMap<TaskId, Task>,
    pub(crate) labels: BTreeMap<LabelId, Label>,
    pub(crate) comments: BTreeMap<CommentId, Comment>,
    pub(crate) time_logs: BTreeMap<TimeLogId, TimeLog>,
    pub(crate) grants: BTreeMap<ProjectId, BTreeSet<UserId>>,
    pub(crate) favorites: BTreeSet<(UserId, ProjectId)>,
    /// Next id handed out by `Transaction::next_id`, shared by all tables
    pub(crate) next_id: u64,
}

macro_rules! load_rows {
    ($map:expr, $rows:expr, $entity:literal) => {
        for row in $rows {
            let id = row.id;
            if $map.insert(id, row).is_some() {
                return Err(StoreError::Duplicate {
                    entity: $entity,
                    id: id.get(),
                });
            }
        }
    };
}

impl Tables {
    /// Build tables from a snapshot, checking ids and references
    ///
    /// # Errors
    /// `Duplicate` or `ForeignKey` on integrity violations.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut t = Self::default();
        let max_id = snapshot.max_id();

        load_rows!(t.users, snapshot.users, "user");
        load_rows!(t.teams, snapshot.teams, "team");
        load_rows!(t.companies, snapshot.companies, "client company");
        load_rows!(t.projects, snapshot.projects, "project");
        load_rows!(t.groups, snapshot.groups, "task group");
        load_rows!(t.tasks, snapshot.tasks, "task");
        load_rows!(t.labels, snapshot.labels, "label");
        load_rows!(t.comments, snapshot.comments, "comment");
        load_rows!(t.time_logs, snapshot.time_logs, "time log");

        for Grant { project_id, user_id } in snapshot.grants {
            t.grants.entry(project_id).or_default().insert(user_id);
        }
        for Favorite { user_id, project_id } in snapshot.favorites {
            t.favorites.insert((user_id, project_id));
        }

        t.check_references()?;
        t.next_id = max_id + 1;
        Ok(t)
    }

    /// Image of every table
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.values().cloned().collect(),
            teams: self.teams.values().cloned().collect(),
            companies: self.companies.values().cloned().collect(),
            projects: self.projects.values().cloned().collect(),
            groups: self.groups.values().cloned().collect(),
            tasks: self.tasks.values().cloned().collect(),
            labels: self.labels.values().cloned().collect(),
            comments: self.comments.values().cloned().collect(),
            time_logs: self.time_logs.values().cloned().collect(),
            grants: self
                .grants
                .iter()
                .flat_map(|(project_id, users)| {
                    users.iter().map(|user_id| Grant {
                        project_id: *project_id,
                        user_id: *user_id,
                    })
                })
                .collect(),
            favorites: self
                .favorites
                .iter()
                .map(|(user_id, project_id)| Favorite {
                    user_id: *user_id,
                    project_id: *project_id,
                })
                .collect(),
        }
    }

    fn check_references(&self) -> Result<(), StoreError> {
        for team in self.teams.values() {
            if let Some(missing) = team.members.iter().find(|u| !self.users.contains_key(u)) {
                return Err(StoreError::foreign_key("team", "user", missing.get()));
            }
        }
        for project in self.projects.values() {
            if let Some(company) = project.client_company_id {
                if !self.companies.contains_key(&company) {
                    return Err(StoreError::foreign_key("project", "client company", company.get()));
                }
            }
        }
        for group in self.groups.values() {
            if !self.projects.contains_key(&group.project_id) {
                return Err(StoreError::foreign_key("task group", "project", group.project_id.get()));
            }
        }
        for task in self.tasks.values() {
            if !self.projects.contains_key(&task.project_id) {
                return Err(StoreError::foreign_key("task", "project", task.project_id.get()));
            }
            if let Some(group) = task.group_id {
                if !self.groups.contains_key(&group) {
                    return Err(StoreError::foreign_key("task", "task group", group.get()));
                }
            }
        }
        for comment in self.comments.values() {
            if !self.tasks.contains_key(&comment.task_id) {
                return Err(StoreError::foreign_key("comment", "task", comment.task_id.get()));
            }
        }
        for log in self.time_logs.values() {
            if !self.tasks.contains_key(&log.task_id) {
                return Err(StoreError::foreign_key("time log", "task", log.task_id.get()));
            }
        }
        for (project, users) in &self.grants {
            if !self.projects.contains_key(project) {
                return Err(StoreError::foreign_key("grant", "project", project.get()));
            }
            if let Some(missing) = users.iter().find(|u| !self.users.contains_key(u)) {
                return Err(StoreError::foreign_key("grant", "user", missing.get()));
            }
        }
        Ok(())
    }

    // Users and teams

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> + '_ {
        self.users.values()
    }

    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> + '_ {
        self.teams.values()
    }

    /// Teams `user` belongs to
    #[must_use]
    pub fn teams_of(&self, user: UserId) -> BTreeSet<TeamId> {
        self.teams
            .values()
            .filter(|team| team.contains(user))
            .map(|team| team.id)
            .collect()
    }

    #[must_use]
    pub fn company(&self, id: ClientCompanyId) -> Option<&ClientCompany> {
        self.companies.get(&id)
    }

    pub fn companies(&self) -> impl Iterator<Item = &ClientCompany> + '_ {
        self.companies.values()
    }

    // Projects

    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> + '_ {
        self.projects.values()
    }

    /// Users explicitly granted access to `project`
    #[must_use]
    pub fn grantees(&self, project: ProjectId) -> BTreeSet<UserId> {
        self.grants.get(&project).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_favorite(&self, user: UserId, project: ProjectId) -> bool {
        self.favorites.contains(&(user, project))
    }

    // Groups and tasks

    #[must_use]
    pub fn group(&self, id: TaskGroupId) -> Option<&TaskGroup> {
        self.groups.get(&id)
    }

    /// Groups of `project` by position
    #[must_use]
    pub fn groups_of(&self, project: ProjectId) -> Vec<&TaskGroup> {
        let mut groups: Vec<_> = self
            .groups
            .values()
            .filter(|g| g.project_id == project)
            .collect();
        groups.sort_by_key(|g| (g.position, g.id));
        groups
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.values()
    }

    /// Tasks of `group` in display order (rank, then id)
    #[must_use]
    pub fn group_tasks(&self, group: TaskGroupId, filter: ArchiveFilter) -> Vec<&Task> {
        let mut tasks: Vec<_> = self
            .tasks
            .values()
            .filter(|t| t.group_id == Some(group) && filter.admits(&t.archival))
            .collect();
        tasks.sort_by_key(|t| (t.rank, t.id));
        tasks
    }

    /// Ids of the active tasks of `group` in display order
    #[must_use]
    pub fn group_order(&self, group: TaskGroupId) -> Vec<TaskId> {
        self.group_tasks(group, ArchiveFilter::Active)
            .into_iter()
            .map(|t| t.id)
            .collect()
    }

    // Satellites

    #[must_use]
    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(&id)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> + '_ {
        self.labels.values()
    }

    /// Label by exact name
    #[must_use]
    pub fn label_named(&self, name: &str) -> Option<&Label> {
        self.labels.values().find(|l| l.name == name)
    }

    /// Comments on `task`, oldest first
    #[must_use]
    pub fn comments_of(&self, task: TaskId) -> Vec<&Comment> {
        self.comments.values().filter(|c| c.task_id == task).collect()
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> + '_ {
        self.comments.values()
    }

    pub fn time_logs(&self) -> impl Iterator<Item = &TimeLog> + '_ {
        self.time_logs.values()
    }
}

impl AccessFacts for Tables {
    fn project_grantees(&self, project: ProjectId) -> BTreeSet<UserId> {
        self.grantees(project)
    }

    fn user_roles(&self, user: UserId) -> BTreeSet<Role> {
        self.users
            .get(&user)
            .map(|u| u.roles.clone())
            .unwrap_or_default()
    }

    fn user_teams(&self, user: UserId) -> BTreeSet<TeamId> {
        self.teams_of(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot() -> Snapshot {
        let now = Utc::now();
        Snapshot {
            users: vec![User::new(UserId(1), "Ada", "ada@example.com")],
            projects: vec![Project::new(ProjectId(2), "Apollo", now)],
            groups: vec![TaskGroup::new(TaskGroupId(3), ProjectId(2), "To do", 0)],
            tasks: vec![
                Task::new(TaskId(10), ProjectId(2), Some(TaskGroupId(3)), "b", UserId(1), now),
                Task::new(TaskId(4), ProjectId(2), Some(TaskGroupId(3)), "a", UserId(1), now),
            ],
            grants: vec![Grant {
                project_id: ProjectId(2),
                user_id: UserId(1),
            }],
            ..Snapshot::default()
        }
    }

    #[test]
    fn from_snapshot_sets_next_id_past_max() {
        let t = Tables::from_snapshot(snapshot()).unwrap();
        assert_eq!(t.next_id, 11);
        assert_eq!(t.grantees(ProjectId(2)), [UserId(1)].into());
    }

    #[test]
    fn equal_ranks_fall_back_to_id() {
        let t = Tables::from_snapshot(snapshot()).unwrap();
        assert_eq!(t.group_order(TaskGroupId(3)), vec![TaskId(4), TaskId(10)]);
    }

    #[test]
    fn dangling_group_rejected() {
        let mut s = snapshot();
        s.tasks[0].group_id = Some(TaskGroupId(99));
        let err = Tables::from_snapshot(s).unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey { entity: "task", .. }));
    }

    #[test]
    fn grant_for_unknown_user_rejected() {
        let mut s = snapshot();
        s.grants.push(Grant {
            project_id: ProjectId(2),
            user_id: UserId(42),
        });
        assert!(Tables::from_snapshot(s).is_err());
    }
}
