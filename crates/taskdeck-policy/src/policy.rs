//! Access policy engine
//!
//! Decision order:
//! 1. the action's permission must be in the actor's resolved set
//! 2. the actor must have access to the target's project
//! 3. task-level rules refine mutations on individual tasks
//!
//! Any failed step is an explicit deny; there is no default-allow path.

use crate::action::{Action, Target};
use crate::actor::Actor;
use crate::error::{DenyReason, PolicyError};
use crate::facts::AccessFacts;
use crate::scope::TaskVisibility;
use serde::{Deserialize, Serialize};
use taskdeck_model::{ClientCompanyId, Permission, Project, Role, Task, UserId};

/// Who inherits a granted team leader's project access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamInheritance {
    /// Only team leaders sharing a team with the granted leader
    #[default]
    LeadersOnly,
    /// Every user sharing a team with the granted leader
    AllMembers,
}

/// Policy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Team inheritance rule
    #[serde(default)]
    pub team_inheritance: TeamInheritance,
}

/// Why a user has access to a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBasis {
    /// Admin role
    Admin,
    /// Explicit (user, project) grant
    Grant,
    /// Shares a team with a granted team leader
    TeamLeader {
        /// The granted leader access is inherited from
        via: UserId,
    },
    /// Client of the project's company
    ClientCompany(ClientCompanyId),
}

/// The access policy engine
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    config: PolicyConfig,
}

impl AccessPolicy {
    /// Create engine with configuration
    #[inline]
    #[must_use]
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> PolicyConfig {
        self.config
    }

    /// Evaluate project access, returning the rule that grants it
    #[must_use]
    pub fn project_access(
        &self,
        actor: &Actor,
        project: &Project,
        facts: &dyn AccessFacts,
    ) -> Option<AccessBasis> {
        if actor.is_admin() {
            return Some(AccessBasis::Admin);
        }

        let grantees = facts.project_grantees(project.id);
        if grantees.contains(&actor.user_id) {
            return Some(AccessBasis::Grant);
        }

        let inherits = match self.config.team_inheritance {
            TeamInheritance::LeadersOnly => actor.has_role(Role::TeamLeader),
            TeamInheritance::AllMembers => true,
        };
        if inherits && !actor.teams.is_empty() {
            let via = grantees.into_iter().find(|&grantee| {
                grantee != actor.user_id
                    && facts.user_roles(grantee).contains(&Role::TeamLeader)
                    && !facts.user_teams(grantee).is_disjoint(&actor.teams)
            });
            if let Some(via) = via {
                return Some(AccessBasis::TeamLeader { via });
            }
        }

        if actor.has_role(Role::Client) {
            if let Some(company) = project.client_company_id {
                if actor.client_companies.contains(&company) {
                    return Some(AccessBasis::ClientCompany(company));
                }
            }
        }

        None
    }

    /// Project access as a boolean
    #[inline]
    #[must_use]
    pub fn has_project_access(
        &self,
        actor: &Actor,
        project: &Project,
        facts: &dyn AccessFacts,
    ) -> bool {
        self.project_access(actor, project, facts).is_some()
    }

    /// Check a permission that is not tied to a project
    ///
    /// # Errors
    /// `PolicyError::Denied` with `MissingPermission`.
    pub fn require_permission(
        &self,
        actor: &Actor,
        action: Action,
        perm: Permission,
    ) -> Result<(), PolicyError> {
        if actor.can(perm) {
            Ok(())
        } else {
            Err(PolicyError::denied(action, DenyReason::MissingPermission(perm)))
        }
    }

    /// Decide whether `actor` may perform `action` on `target`
    ///
    /// # Errors
    /// `PolicyError::Denied` naming the first failed step.
    pub fn authorize(
        &self,
        actor: &Actor,
        action: Action,
        target: Target<'_>,
        facts: &dyn AccessFacts,
    ) -> Result<AccessBasis, PolicyError> {
        self.require_permission(actor, action, target.required_permission(action))?;

        let project = target.project();
        let basis = self
            .project_access(actor, project, facts)
            .ok_or_else(|| PolicyError::denied(action, DenyReason::NoProjectAccess(project.id)))?;

        self.task_rule(actor, action, target)
            .map_err(|reason| PolicyError::denied(action, reason))?;

        Ok(basis)
    }

    fn task_rule(&self, actor: &Actor, action: Action, target: Target<'_>) -> Result<(), DenyReason> {
        if actor.is_admin() {
            return Ok(());
        }

        match target {
            Target::Project(_) => {
                if action.mutates_tasks() && actor.is_client_only() {
                    Err(DenyReason::ClientReadOnly)
                } else {
                    Ok(())
                }
            }
            Target::Task(task, _) => match action {
                Action::View => {
                    if TaskVisibility::for_actor(actor).admits(task) {
                        Ok(())
                    } else {
                        Err(task_rule(task, "task is not visible to this user"))
                    }
                }
                Action::EditUserAccess => Ok(()),
                _ if actor.is_client_only() => Err(DenyReason::ClientReadOnly),
                Action::Create | Action::Reorder => Ok(()),
                Action::Update | Action::Archive | Action::Restore => {
                    if actor.has_role(Role::TeamLeader) && task.created_by == actor.user_id {
                        Ok(())
                    } else {
                        Err(task_rule(task, "only the team leader who created the task may modify it"))
                    }
                }
                Action::Complete => {
                    let assigned_to_me = task.assigned_to == Some(actor.user_id);
                    let as_leader = actor.has_role(Role::TeamLeader)
                        && (task.created_by == actor.user_id || assigned_to_me);
                    let as_member = assigned_to_me && actor.roles.iter().any(|r| r.is_member_like());
                    if as_leader || as_member {
                        Ok(())
                    } else {
                        Err(task_rule(task, "only the assignee may complete the task"))
                    }
                }
            },
        }
    }
}

fn task_rule(task: &Task, rule: &'static str) -> DenyReason {
    DenyReason::TaskRule {
        task: task.id,
        rule,
    }
}
