//! Consolidated access scoping
//!
//! Task listings, dashboards and reports all narrow their data through
//! [`ProjectScope`], so "which projects and tasks can this user see" is
//! answered in exactly one place.

use crate::actor::Actor;
use crate::facts::AccessFacts;
use crate::policy::AccessPolicy;
use std::collections::BTreeSet;
use taskdeck_model::{Project, ProjectId, Role, Task, UserId};

/// Which tasks inside an accessible project a user sees
///
/// The union over the actor's roles:
/// - admin: every task
/// - team leader: tasks assigned to or created by the user
/// - member-like roles: tasks assigned to the user
/// - client: tasks the user is subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskVisibility {
    user: UserId,
    all: bool,
    assigned: bool,
    created: bool,
    subscribed: bool,
}

impl TaskVisibility {
    /// Visibility rule for `actor`
    #[must_use]
    pub fn for_actor(actor: &Actor) -> Self {
        let mut vis = Self {
            user: actor.user_id,
            all: false,
            assigned: false,
            created: false,
            subscribed: false,
        };
        for role in &actor.roles {
            match role {
                Role::Admin => vis.all = true,
                Role::TeamLeader => {
                    vis.assigned = true;
                    vis.created = true;
                }
                Role::Client => vis.subscribed = true,
                _ => vis.assigned = true,
            }
        }
        vis
    }

    /// Sees every task
    #[inline]
    #[must_use]
    pub fn sees_all(&self) -> bool {
        self.all
    }

    /// Whether `task` is visible
    #[must_use]
    pub fn admits(&self, task: &Task) -> bool {
        self.all
            || (self.assigned && task.assigned_to == Some(self.user))
            || (self.created && task.created_by == self.user)
            || (self.subscribed && task.subscribers.contains(&self.user))
    }
}

/// Projects and tasks visible to one actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    /// `None` means unrestricted (admin)
    projects: Option<BTreeSet<ProjectId>>,
    visibility: TaskVisibility,
}

impl ProjectScope {
    /// Resolve the scope of `actor` over `projects`
    ///
    /// Projects the actor has no access to are excluded before any
    /// downstream computation sees them.
    pub fn resolve<'a>(
        policy: &AccessPolicy,
        actor: &Actor,
        facts: &dyn AccessFacts,
        projects: impl IntoIterator<Item = &'a Project>,
    ) -> Self {
        let visibility = TaskVisibility::for_actor(actor);
        if actor.is_admin() {
            return Self {
                projects: None,
                visibility,
            };
        }
        let accessible = projects
            .into_iter()
            .filter(|project| policy.has_project_access(actor, project, facts))
            .map(|project| project.id)
            .collect();
        Self {
            projects: Some(accessible),
            visibility,
        }
    }

    /// Task visibility rule
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> TaskVisibility {
        self.visibility
    }

    /// Whether the scope is unrestricted
    #[inline]
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.projects.is_none()
    }

    /// Whether `project` is in scope
    #[must_use]
    pub fn admits_project(&self, project: ProjectId) -> bool {
        self.projects
            .as_ref()
            .map_or(true, |ids| ids.contains(&project))
    }

    /// Whether `task` is in scope: project accessible and task visible
    #[must_use]
    pub fn admits_task(&self, task: &Task) -> bool {
        self.admits_project(task.project_id) && self.visibility.admits(task)
    }

    /// Accessible project ids, `None` when unrestricted
    #[must_use]
    pub fn project_ids(&self) -> Option<&BTreeSet<ProjectId>> {
        self.projects.as_ref()
    }
}
