//! Canonical roles and permissions
//!
//! Role and permission names arrive from configuration and storage in
//! whatever casing the writer used ("Team Leader", "team_leader", ...).
//! They are normalized once, here, and compared as enums everywhere else.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalize a role or permission name
///
/// Trims, lower-cases and collapses `_`, `-` and runs of whitespace into a
/// single space.
#[must_use]
pub fn normalize_name(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    /// Full access to every project and task
    Admin,
    /// Leads a team; inherits nothing by default but manages own tasks
    TeamLeader,
    /// External client; read-only on the projects of its companies
    Client,
    /// Generic team member
    Member,
    /// Developer (member rules)
    Developer,
    /// QA engineer (member rules)
    QaEngineer,
    /// Designer (member rules)
    Designer,
    /// Head of implementation (member rules)
    HeadImplementation,
}

impl Role {
    /// All roles, in seeding order
    pub const ALL: [Role; 8] = [
        Role::Admin,
        Role::TeamLeader,
        Role::Client,
        Role::Member,
        Role::Developer,
        Role::QaEngineer,
        Role::Designer,
        Role::HeadImplementation,
    ];

    /// Canonical (normalized) name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TeamLeader => "team leader",
            Role::Client => "client",
            Role::Member => "member",
            Role::Developer => "developer",
            Role::QaEngineer => "qa engineer",
            Role::Designer => "designer",
            Role::HeadImplementation => "head implementation",
        }
    }

    /// Whether this role follows the member task rules
    #[inline]
    #[must_use]
    pub fn is_member_like(self) -> bool {
        !matches!(self, Role::Admin | Role::TeamLeader | Role::Client)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_name(s);
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == name)
            .ok_or_else(|| ModelError::UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Permission string carried by roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Permission {
    ViewProjects,
    CreateProject,
    EditProject,
    ArchiveProject,
    RestoreProject,
    EditUserAccess,
    ViewTasks,
    CreateTask,
    EditTask,
    ArchiveTask,
    RestoreTask,
    ReorderTask,
    CompleteTask,
    ManageLabels,
    ManageTeams,
    ViewLoggedTimeSumReport,
    ViewDailyLoggedTimeReport,
    ViewFixedPriceSumReport,
    ViewWorkStatisticsReport,
}

impl Permission {
    /// Every permission
    pub const ALL: [Permission; 19] = [
        Permission::ViewProjects,
        Permission::CreateProject,
        Permission::EditProject,
        Permission::ArchiveProject,
        Permission::RestoreProject,
        Permission::EditUserAccess,
        Permission::ViewTasks,
        Permission::CreateTask,
        Permission::EditTask,
        Permission::ArchiveTask,
        Permission::RestoreTask,
        Permission::ReorderTask,
        Permission::CompleteTask,
        Permission::ManageLabels,
        Permission::ManageTeams,
        Permission::ViewLoggedTimeSumReport,
        Permission::ViewDailyLoggedTimeReport,
        Permission::ViewFixedPriceSumReport,
        Permission::ViewWorkStatisticsReport,
    ];

    /// Canonical permission string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewProjects => "view projects",
            Permission::CreateProject => "create project",
            Permission::EditProject => "edit project",
            Permission::ArchiveProject => "archive project",
            Permission::RestoreProject => "restore project",
            Permission::EditUserAccess => "edit user access",
            Permission::ViewTasks => "view tasks",
            Permission::CreateTask => "create task",
            Permission::EditTask => "edit task",
            Permission::ArchiveTask => "archive task",
            Permission::RestoreTask => "restore task",
            Permission::ReorderTask => "reorder task",
            Permission::CompleteTask => "complete task",
            Permission::ManageLabels => "manage labels",
            Permission::ManageTeams => "manage teams",
            Permission::ViewLoggedTimeSumReport => "view logged time sum report",
            Permission::ViewDailyLoggedTimeReport => "view daily logged time report",
            Permission::ViewFixedPriceSumReport => "view fixed price sum report",
            Permission::ViewWorkStatisticsReport => "view work statistics report",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_name(s);
        Permission::ALL
            .into_iter()
            .find(|perm| perm.as_str() == name)
            .ok_or_else(|| ModelError::UnknownPermission(s.to_string()))
    }
}

impl TryFrom<String> for Permission {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(perm: Permission) -> Self {
        perm.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn role_names_normalize() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("  ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Team Leader".parse::<Role>().unwrap(), Role::TeamLeader);
        assert_eq!("team_leader".parse::<Role>().unwrap(), Role::TeamLeader);
        assert_eq!("team-leader".parse::<Role>().unwrap(), Role::TeamLeader);
        assert_eq!("QA  Engineer".parse::<Role>().unwrap(), Role::QaEngineer);
    }

    #[test]
    fn unknown_role_rejected() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownRole(_)));
    }

    #[test]
    fn member_like_roles() {
        assert!(Role::Member.is_member_like());
        assert!(Role::Developer.is_member_like());
        assert!(!Role::Admin.is_member_like());
        assert!(!Role::TeamLeader.is_member_like());
        assert!(!Role::Client.is_member_like());
    }

    #[test]
    fn permission_round_trips_through_canonical_name() {
        for perm in Permission::ALL {
            assert_eq!(perm.as_str().parse::<Permission>().unwrap(), perm);
        }
    }

    #[test]
    fn role_serializes_canonically() {
        let json = serde_json::to_string(&Role::TeamLeader).unwrap();
        assert_eq!(json, "\"team leader\"");
        let parsed: Role = serde_json::from_str("\"Team Leader\"").unwrap();
        assert_eq!(parsed, Role::TeamLeader);
    }

    proptest! {
        #[test]
        fn prop_role_casing_is_irrelevant(idx in 0usize..Role::ALL.len(), upper in any::<bool>(), sep in prop_oneof![Just(" "), Just("_"), Just("-"), Just("  ")]) {
            let role = Role::ALL[idx];
            let mut raw = role.as_str().replace(' ', sep);
            if upper {
                raw = raw.to_uppercase();
            }
            prop_assert_eq!(raw.parse::<Role>().unwrap(), role);
        }

        #[test]
        fn prop_normalize_is_idempotent(raw in "[A-Za-z _-]{0,24}") {
            let once = normalize_name(&raw);
            prop_assert_eq!(normalize_name(&once), once);
        }
    }
}
