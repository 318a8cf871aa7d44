//! State the policy decides over

use std::collections::BTreeSet;
use taskdeck_model::{ProjectId, Role, TeamId, UserId};

/// Read-only view of grants, roles and team membership
///
/// Implemented by the store; tests implement it over plain maps.
pub trait AccessFacts {
    /// Users holding an explicit grant on `project`
    fn project_grantees(&self, project: ProjectId) -> BTreeSet<UserId>;

    /// Canonical roles of `user` (empty for unknown users)
    fn user_roles(&self, user: UserId) -> BTreeSet<Role>;

    /// Teams `user` belongs to
    fn user_teams(&self, user: UserId) -> BTreeSet<TeamId>;
}
