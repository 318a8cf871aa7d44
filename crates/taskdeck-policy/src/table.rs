//! Role → permission table

use crate::actor::PermissionSet;
use crate::error::PolicyError;
use std::collections::{BTreeMap, BTreeSet};
use taskdeck_model::{Permission, Role};

/// Static mapping from role to the permissions it carries
///
/// Roles missing from the table carry nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    grants: BTreeMap<Role, BTreeSet<Permission>>,
}

impl PermissionTable {
    /// Empty table (every role carries nothing)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            grants: BTreeMap::new(),
        }
    }

    /// Build from configuration: role name → permission names
    ///
    /// Names are normalized, so `"Team Leader"` and `"team_leader"` are the
    /// same role.
    ///
    /// # Errors
    /// `PolicyError::Config` on an unknown role or permission name.
    pub fn from_config<S: AsRef<str>>(
        entries: &BTreeMap<String, Vec<S>>,
    ) -> Result<Self, PolicyError> {
        let mut table = Self::empty();
        for (role_name, perms) in entries {
            let role: Role = role_name
                .parse()
                .map_err(|e: taskdeck_model::ModelError| PolicyError::Config(e.to_string()))?;
            let parsed = perms
                .iter()
                .map(|p| p.as_ref().parse::<Permission>())
                .collect::<Result<BTreeSet<_>, _>>()
                .map_err(|e| PolicyError::Config(e.to_string()))?;
            table.grants.entry(role).or_default().extend(parsed);
        }
        Ok(table)
    }

    /// Replace the permissions of one role
    #[must_use]
    pub fn with_role(mut self, role: Role, perms: impl IntoIterator<Item = Permission>) -> Self {
        self.grants.insert(role, perms.into_iter().collect());
        self
    }

    /// Permissions of a single role
    #[must_use]
    pub fn permissions_of(&self, role: Role) -> BTreeSet<Permission> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }

    /// Union of the permissions of all `roles`
    #[must_use]
    pub fn resolve<'a>(&self, roles: impl IntoIterator<Item = &'a Role>) -> PermissionSet {
        roles
            .into_iter()
            .filter_map(|role| self.grants.get(role))
            .flatten()
            .copied()
            .collect()
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        use Permission as P;

        let member = [
            P::ViewProjects,
            P::ViewTasks,
            P::CompleteTask,
            P::ViewWorkStatisticsReport,
        ];
        let leader = [
            P::ViewProjects,
            P::ViewTasks,
            P::CreateTask,
            P::EditTask,
            P::ArchiveTask,
            P::RestoreTask,
            P::ReorderTask,
            P::CompleteTask,
            P::ViewWorkStatisticsReport,
        ];
        let client = [P::ViewProjects, P::ViewTasks, P::ViewWorkStatisticsReport];

        let mut table = Self::empty()
            .with_role(Role::Admin, P::ALL)
            .with_role(Role::TeamLeader, leader)
            .with_role(Role::Client, client);
        for role in Role::ALL.into_iter().filter(|r| r.is_member_like()) {
            table = table.with_role(role, member);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_admin_has_everything() {
        let table = PermissionTable::default();
        let set = table.resolve(&[Role::Admin]);
        for perm in Permission::ALL {
            assert!(set.contains(perm), "admin missing {perm}");
        }
    }

    #[test]
    fn default_client_is_read_only() {
        let table = PermissionTable::default();
        let set = table.resolve(&[Role::Client]);
        assert!(set.contains(Permission::ViewTasks));
        assert!(!set.contains(Permission::CreateTask));
        assert!(!set.contains(Permission::CompleteTask));
        assert!(!set.contains(Permission::ReorderTask));
    }

    #[test]
    fn union_over_roles() {
        let table = PermissionTable::default();
        let set = table.resolve(&[Role::Client, Role::Developer]);
        assert!(set.contains(Permission::CompleteTask));
        assert!(!set.contains(Permission::EditTask));
    }

    #[test]
    fn no_roles_no_permissions() {
        let table = PermissionTable::default();
        assert!(table.resolve(&[]).is_empty());
    }

    #[test]
    fn from_config_normalizes_names() {
        let mut entries = BTreeMap::new();
        entries.insert("Team_Leader".to_string(), vec!["View Tasks", "reorder-task"]);
        let table = PermissionTable::from_config(&entries).unwrap();
        let set = table.resolve(&[Role::TeamLeader]);
        assert!(set.contains(Permission::ViewTasks));
        assert!(set.contains(Permission::ReorderTask));
        assert!(!set.contains(Permission::EditTask));
        assert!(table.resolve(&[Role::Admin]).is_empty());
    }

    #[test]
    fn from_config_rejects_unknown_names() {
        let mut entries = BTreeMap::new();
        entries.insert("wizard".to_string(), vec!["view tasks"]);
        assert!(matches!(
            PermissionTable::from_config(&entries),
            Err(PolicyError::Config(_))
        ));

        let mut entries = BTreeMap::new();
        entries.insert("admin".to_string(), vec!["fly"]);
        assert!(matches!(
            PermissionTable::from_config(&entries),
            Err(PolicyError::Config(_))
        ));
    }
}
