//! Actions and targets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use taskdeck_model::{Permission, Project, Task};

/// Action a user may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Read
    View,
    /// Create a task inside the target project
    Create,
    /// Edit fields
    Update,
    /// Soft-delete
    Archive,
    /// Undo an archive
    Restore,
    /// Reorder or move tasks
    Reorder,
    /// Mark complete / incomplete
    Complete,
    /// Replace the project's access grants
    EditUserAccess,
}

impl Action {
    /// Every action
    pub const ALL: [Action; 8] = [
        Action::View,
        Action::Create,
        Action::Update,
        Action::Archive,
        Action::Restore,
        Action::Reorder,
        Action::Complete,
        Action::EditUserAccess,
    ];

    /// Kebab-case name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Archive => "archive",
            Action::Restore => "restore",
            Action::Reorder => "reorder",
            Action::Complete => "complete",
            Action::EditUserAccess => "edit-user-access",
        }
    }

    /// Whether the action changes tasks
    #[inline]
    #[must_use]
    pub fn mutates_tasks(self) -> bool {
        matches!(
            self,
            Action::Create
                | Action::Update
                | Action::Archive
                | Action::Restore
                | Action::Reorder
                | Action::Complete
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "view" => Ok(Action::View),
            "create" => Ok(Action::Create),
            "update" | "edit" => Ok(Action::Update),
            "archive" | "delete" => Ok(Action::Archive),
            "restore" => Ok(Action::Restore),
            "reorder" | "move" => Ok(Action::Reorder),
            "complete" => Ok(Action::Complete),
            "edit-user-access" => Ok(Action::EditUserAccess),
            _ => Err(format!("unknown action: {s}")),
        }
    }
}

/// What an action is applied to
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The project itself, or its task collection
    Project(&'a Project),
    /// One task and the project it belongs to
    Task(&'a Task, &'a Project),
}

impl<'a> Target<'a> {
    /// Project the target lives in
    #[inline]
    #[must_use]
    pub fn project(&self) -> &'a Project {
        match *self {
            Target::Project(project) | Target::Task(_, project) => project,
        }
    }

    /// Permission `action` requires on this target
    #[must_use]
    pub fn required_permission(&self, action: Action) -> Permission {
        use Permission as P;
        match (self, action) {
            (Target::Project(_), Action::View) => P::ViewProjects,
            (Target::Project(_), Action::Update) => P::EditProject,
            (Target::Project(_), Action::Archive) => P::ArchiveProject,
            (Target::Project(_), Action::Restore) => P::RestoreProject,
            (Target::Task(..), Action::View) => P::ViewTasks,
            (Target::Task(..), Action::Update) => P::EditTask,
            (Target::Task(..), Action::Archive) => P::ArchiveTask,
            (Target::Task(..), Action::Restore) => P::RestoreTask,
            (_, Action::Create) => P::CreateTask,
            (_, Action::Reorder) => P::ReorderTask,
            (_, Action::Complete) => P::CompleteTask,
            (_, Action::EditUserAccess) => P::EditUserAccess,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskdeck_model::{ProjectId, TaskGroupId, TaskId, UserId};

    #[test]
    fn parse_aliases() {
        assert_eq!("delete".parse::<Action>().unwrap(), Action::Archive);
        assert_eq!("edit_user_access".parse::<Action>().unwrap(), Action::EditUserAccess);
        assert!("fly".parse::<Action>().is_err());
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn permissions_depend_on_target_kind() {
        let project = Project::new(ProjectId(1), "p", Utc::now());
        let task = Task::new(TaskId(1), ProjectId(1), Some(TaskGroupId(1)), "t", UserId(1), Utc::now());

        let on_project = Target::Project(&project);
        let on_task = Target::Task(&task, &project);

        assert_eq!(on_project.required_permission(Action::View), Permission::ViewProjects);
        assert_eq!(on_task.required_permission(Action::View), Permission::ViewTasks);
        assert_eq!(on_project.required_permission(Action::Archive), Permission::ArchiveProject);
        assert_eq!(on_task.required_permission(Action::Archive), Permission::ArchiveTask);
        assert_eq!(on_project.required_permission(Action::Reorder), Permission::ReorderTask);
        assert_eq!(on_task.project().id, ProjectId(1));
    }
}
