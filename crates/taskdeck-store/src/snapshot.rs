//! Serializable image of the store

use serde::{Deserialize, Serialize};
use taskdeck_model::{
    ClientCompany, Comment, Label, Project, ProjectId, Task, TaskGroup, Team, TimeLog, User, UserId,
};

/// Explicit (user, project) access grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub project_id: ProjectId,
    pub user_id: UserId,
}

/// Project pinned by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: UserId,
    pub project_id: ProjectId,
}

/// Every table as plain row lists
///
/// Missing tables deserialize as empty, so fixtures only spell out what
/// they need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub teams: Vec<Team>,
    pub companies: Vec<ClientCompany>,
    pub projects: Vec<Project>,
    pub groups: Vec<TaskGroup>,
    pub tasks: Vec<Task>,
    pub labels: Vec<Label>,
    pub comments: Vec<Comment>,
    pub time_logs: Vec<TimeLog>,
    pub grants: Vec<Grant>,
    pub favorites: Vec<Favorite>,
}

impl Snapshot {
    /// Largest id across all tables
    #[must_use]
    pub fn max_id(&self) -> u64 {
        let ids = self
            .users
            .iter()
            .map(|r| r.id.get())
            .chain(self.teams.iter().map(|r| r.id.get()))
            .chain(self.companies.iter().map(|r| r.id.get()))
            .chain(self.projects.iter().map(|r| r.id.get()))
            .chain(self.groups.iter().map(|r| r.id.get()))
            .chain(self.tasks.iter().map(|r| r.id.get()))
            .chain(self.labels.iter().map(|r| r.id.get()))
            .chain(self.comments.iter().map(|r| r.id.get()))
            .chain(self.time_logs.iter().map(|r| r.id.get()));
        ids.max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_loads() {
        let json = r#"{
            "users": [{"id": 3, "name": "Ada", "email": "ada@example.com", "roles": ["Admin"]}],
            "grants": [{"project_id": 1, "user_id": 3}]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.users.len(), 1);
        assert!(snapshot.users[0].is_admin());
        assert!(snapshot.projects.is_empty());
        assert_eq!(snapshot.max_id(), 3);
    }
}
