//! Acting user context

use crate::table::PermissionTable;
use std::collections::BTreeSet;
use taskdeck_model::{ClientCompanyId, Permission, Role, TeamId, User, UserId};

/// Resolved permission set of a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Membership test
    #[inline]
    #[must_use]
    pub fn contains(&self, perm: Permission) -> bool {
        self.0.contains(&perm)
    }

    /// No permissions at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate permissions in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The authenticated user an operation runs on behalf of
///
/// Built once per request by the identity provider and passed explicitly
/// into every policy and query function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User id
    pub user_id: UserId,
    /// Canonical roles
    pub roles: BTreeSet<Role>,
    /// Teams the user belongs to
    pub teams: BTreeSet<TeamId>,
    /// Client companies the user represents
    pub client_companies: BTreeSet<ClientCompanyId>,
    /// Union of the permissions of all roles
    pub permissions: PermissionSet,
}

impl Actor {
    /// Resolve an actor from a user record and its team memberships
    #[must_use]
    pub fn resolve(
        user: &User,
        teams: impl IntoIterator<Item = TeamId>,
        table: &PermissionTable,
    ) -> Self {
        Self {
            user_id: user.id,
            roles: user.roles.clone(),
            teams: teams.into_iter().collect(),
            client_companies: user.client_company_ids.clone(),
            permissions: table.resolve(&user.roles),
        }
    }

    /// Role membership test
    #[inline]
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Holds the admin role
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Permission membership test
    #[inline]
    #[must_use]
    pub fn can(&self, perm: Permission) -> bool {
        self.permissions.contains(perm)
    }

    /// Whether every role is `client`; such actors never mutate tasks
    #[must_use]
    pub fn is_client_only(&self) -> bool {
        !self.roles.is_empty() && self.roles.iter().all(|r| *r == Role::Client)
    }
}
