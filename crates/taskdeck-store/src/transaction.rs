//! Undo-logged write transactions
//!
//! A [`Transaction`] holds the store's write lock for its whole lifetime.
//! Every write records the previous row so that dropping the transaction
//! without [`Transaction::commit`] restores the exact prior state.

use crate::error::StoreError;
use crate::tables::Tables;
use parking_lot::RwLockWriteGuard;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use taskdeck_model::{
    ClientCompany, ClientCompanyId, Comment, CommentId, Label, LabelId, Project, ProjectId, Task,
    TaskGroup, TaskGroupId, TaskId, Team, TeamId, TimeLog, TimeLogId, User, UserId,
};

#[derive(Debug)]
enum Undo {
    User(UserId, Option<User>),
    Team(TeamId, Option<Team>),
    Company(ClientCompanyId, Option<ClientCompany>),
    Project(ProjectId, Option<Project>),
    Group(TaskGroupId, Option<TaskGroup>),
    Task(TaskId, Option<Task>),
    Label(LabelId, Option<Label>),
    Comment(CommentId, Option<Comment>),
    TimeLog(TimeLogId, Option<TimeLog>),
    Grants(ProjectId, Option<BTreeSet<UserId>>),
    Favorite(UserId, ProjectId, bool),
    NextId(u64),
}

fn restore<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, prev: Option<V>) {
    match prev {
        Some(row) => {
            map.insert(key, row);
        }
        None => {
            map.remove(&key);
        }
    }
}

/// Exclusive, all-or-nothing write access to the tables
pub struct Transaction<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    undo: Vec<Undo>,
    committed: bool,
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("pending", &self.undo.len())
            .field("committed", &self.committed)
            .finish()
    }
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(tables: RwLockWriteGuard<'a, Tables>) -> Self {
        Self {
            tables,
            undo: Vec::new(),
            committed: false,
        }
    }

    /// Make every change permanent
    pub fn commit(mut self) {
        self.committed = true;
        tracing::trace!("transaction committed with {} writes", self.undo.len());
    }

    /// Undo every change and release the lock
    pub fn rollback(self) {
        drop(self);
    }

    /// Allocate a fresh row id
    pub fn next_id(&mut self) -> u64 {
        self.undo.push(Undo::NextId(self.tables.next_id));
        let id = self.tables.next_id.max(1);
        self.tables.next_id = id + 1;
        id
    }

    fn bump_next_id(&mut self, used: u64) {
        if used >= self.tables.next_id {
            self.undo.push(Undo::NextId(self.tables.next_id));
            self.tables.next_id = used + 1;
        }
    }

    pub fn put_user(&mut self, user: User) {
        self.bump_next_id(user.id.get());
        let id = user.id;
        let prev = self.tables.users.insert(id, user);
        self.undo.push(Undo::User(id, prev));
    }

    pub fn put_team(&mut self, team: Team) -> Result<(), StoreError> {
        if let Some(missing) = team.members.iter().find(|u| !self.tables.users.contains_key(u)) {
            return Err(StoreError::foreign_key("team", "user", missing.get()));
        }
        self.bump_next_id(team.id.get());
        let id = team.id;
        let prev = self.tables.teams.insert(id, team);
        self.undo.push(Undo::Team(id, prev));
        Ok(())
    }

    pub fn remove_team(&mut self, id: TeamId) -> Result<Team, StoreError> {
        let team = self
            .tables
            .teams
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("team", id.get()))?;
        self.undo.push(Undo::Team(id, Some(team.clone())));
        Ok(team)
    }

    pub fn put_company(&mut self, company: ClientCompany) {
        self.bump_next_id(company.id.get());
        let id = company.id;
        let prev = self.tables.companies.insert(id, company);
        self.undo.push(Undo::Company(id, prev));
    }

    pub fn put_project(&mut self, project: Project) {
        self.bump_next_id(project.id.get());
        let id = project.id;
        let prev = self.tables.projects.insert(id, project);
        self.undo.push(Undo::Project(id, prev));
    }

    pub fn put_group(&mut self, group: TaskGroup) -> Result<(), StoreError> {
        if !self.tables.projects.contains_key(&group.project_id) {
            return Err(StoreError::foreign_key("task group", "project", group.project_id.get()));
        }
        self.bump_next_id(group.id.get());
        let id = group.id;
        let prev = self.tables.groups.insert(id, group);
        self.undo.push(Undo::Group(id, prev));
        Ok(())
    }

    pub fn put_task(&mut self, task: Task) -> Result<(), StoreError> {
        if !self.tables.projects.contains_key(&task.project_id) {
            return Err(StoreError::foreign_key("task", "project", task.project_id.get()));
        }
        if let Some(group) = task.group_id {
            if !self.tables.groups.contains_key(&group) {
                return Err(StoreError::foreign_key("task", "task group", group.get()));
            }
        }
        self.bump_next_id(task.id.get());
        let id = task.id;
        let prev = self.tables.tasks.insert(id, task);
        self.undo.push(Undo::Task(id, prev));
        Ok(())
    }

    /// Apply `f` to an existing task
    pub fn update_task<T>(
        &mut self,
        id: TaskId,
        f: impl FnOnce(&mut Task) -> T,
    ) -> Result<T, StoreError> {
        let task = self
            .tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("task", id.get()))?;
        let prev = task.clone();
        let out = f(task);
        self.undo.push(Undo::Task(id, Some(prev)));
        Ok(out)
    }

    /// Apply `f` to an existing task group
    pub fn update_group<T>(
        &mut self,
        id: TaskGroupId,
        f: impl FnOnce(&mut TaskGroup) -> T,
    ) -> Result<T, StoreError> {
        let group = self
            .tables
            .groups
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("task group", id.get()))?;
        let prev = group.clone();
        let out = f(group);
        self.undo.push(Undo::Group(id, Some(prev)));
        Ok(out)
    }

    pub fn put_label(&mut self, label: Label) {
        self.bump_next_id(label.id.get());
        let id = label.id;
        let prev = self.tables.labels.insert(id, label);
        self.undo.push(Undo::Label(id, prev));
    }

    pub fn remove_label(&mut self, id: LabelId) -> Result<Label, StoreError> {
        let label = self
            .tables
            .labels
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("label", id.get()))?;
        self.undo.push(Undo::Label(id, Some(label.clone())));
        Ok(label)
    }

    pub fn insert_comment(&mut self, comment: Comment) -> Result<(), StoreError> {
        if !self.tables.tasks.contains_key(&comment.task_id) {
            return Err(StoreError::foreign_key("comment", "task", comment.task_id.get()));
        }
        if self.tables.comments.contains_key(&comment.id) {
            return Err(StoreError::Duplicate {
                entity: "comment",
                id: comment.id.get(),
            });
        }
        self.bump_next_id(comment.id.get());
        self.undo.push(Undo::Comment(comment.id, None));
        self.tables.comments.insert(comment.id, comment);
        Ok(())
    }

    pub fn insert_time_log(&mut self, log: TimeLog) -> Result<(), StoreError> {
        if !self.tables.tasks.contains_key(&log.task_id) {
            return Err(StoreError::foreign_key("time log", "task", log.task_id.get()));
        }
        if !self.tables.users.contains_key(&log.user_id) {
            return Err(StoreError::foreign_key("time log", "user", log.user_id.get()));
        }
        if self.tables.time_logs.contains_key(&log.id) {
            return Err(StoreError::Duplicate {
                entity: "time log",
                id: log.id.get(),
            });
        }
        self.bump_next_id(log.id.get());
        self.undo.push(Undo::TimeLog(log.id, None));
        self.tables.time_logs.insert(log.id, log);
        Ok(())
    }

    /// Delete every grant of `project`, returning the removed grantees
    pub fn delete_grants(&mut self, project: ProjectId) -> BTreeSet<UserId> {
        let prev = self.tables.grants.remove(&project);
        let removed = prev.clone().unwrap_or_default();
        self.undo.push(Undo::Grants(project, prev));
        removed
    }

    /// Insert one (user, project) grant
    ///
    /// # Errors
    /// `ForeignKey` when the user or project does not exist.
    pub fn insert_grant(&mut self, project: ProjectId, user: UserId) -> Result<(), StoreError> {
        if !self.tables.projects.contains_key(&project) {
            return Err(StoreError::foreign_key("grant", "project", project.get()));
        }
        if !self.tables.users.contains_key(&user) {
            return Err(StoreError::foreign_key("grant", "user", user.get()));
        }
        let prev = self.tables.grants.get(&project).cloned();
        self.undo.push(Undo::Grants(project, prev));
        self.tables.grants.entry(project).or_default().insert(user);
        Ok(())
    }

    pub fn set_favorite(&mut self, user: UserId, project: ProjectId, favorite: bool) {
        let was = self.tables.favorites.contains(&(user, project));
        if was == favorite {
            return;
        }
        self.undo.push(Undo::Favorite(user, project, was));
        if favorite {
            self.tables.favorites.insert((user, project));
        } else {
            self.tables.favorites.remove(&(user, project));
        }
    }

    fn undo_all(&mut self) {
        let tables = &mut *self.tables;
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::User(k, v) => restore(&mut tables.users, k, v),
                Undo::Team(k, v) => restore(&mut tables.teams, k, v),
                Undo::Company(k, v) => restore(&mut tables.companies, k, v),
                Undo::Project(k, v) => restore(&mut tables.projects, k, v),
                Undo::Group(k, v) => restore(&mut tables.groups, k, v),
                Undo::Task(k, v) => restore(&mut tables.tasks, k, v),
                Undo::Label(k, v) => restore(&mut tables.labels, k, v),
                Undo::Comment(k, v) => restore(&mut tables.comments, k, v),
                Undo::TimeLog(k, v) => restore(&mut tables.time_logs, k, v),
                Undo::Grants(k, v) => restore(&mut tables.grants, k, v),
                Undo::Favorite(user, project, true) => {
                    tables.favorites.insert((user, project));
                }
                Undo::Favorite(user, project, false) => {
                    tables.favorites.remove(&(user, project));
                }
                Undo::NextId(prev) => tables.next_id = prev,
            }
        }
    }
}

impl Deref for Transaction<'_> {
    type Target = Tables;

    fn deref(&self) -> &Tables {
        &self.tables
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            tracing::debug!("rolling back transaction ({} writes)", self.undo.len());
            self.undo_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::MemoryStore;
    use chrono::Utc;
    use taskdeck_model::{Project, ProjectId, User, UserId};

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        tx.put_user(User::new(UserId(1), "Ada", "ada@example.com"));
        tx.put_user(User::new(UserId(2), "Bob", "bob@example.com"));
        tx.put_project(Project::new(ProjectId(10), "Apollo", Utc::now()));
        tx.insert_grant(ProjectId(10), UserId(1)).unwrap();
        tx.commit();
        store
    }

    #[test]
    fn drop_without_commit_rolls_back() {
        let store = seeded();
        {
            let mut tx = store.begin();
            tx.delete_grants(ProjectId(10));
            tx.insert_grant(ProjectId(10), UserId(2)).unwrap();
            tx.set_favorite(UserId(2), ProjectId(10), true);
            let id = tx.next_id();
            assert_eq!(id, 11);
        }
        let t = store.read();
        assert_eq!(t.grantees(ProjectId(10)), [UserId(1)].into());
        assert!(!t.is_favorite(UserId(2), ProjectId(10)));
        assert_eq!(t.next_id, 11);
    }

    #[test]
    fn closure_error_rolls_back() {
        let store = seeded();
        let result: Result<(), crate::StoreError> = store.transaction(|tx| {
            tx.delete_grants(ProjectId(10));
            tx.insert_grant(ProjectId(10), UserId(2))?;
            tx.insert_grant(ProjectId(10), UserId(99))?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(store.read().grantees(ProjectId(10)), [UserId(1)].into());
    }

    #[test]
    fn explicit_ids_advance_sequence() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        tx.put_user(User::new(UserId(40), "Ada", "ada@example.com"));
        assert_eq!(tx.next_id(), 41);
        tx.commit();
    }
}
