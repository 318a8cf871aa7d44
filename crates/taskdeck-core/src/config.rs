//! Service configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration.
//!
//! ```toml
//! lock_timeout_ms = 2000
//! team_inheritance = "all_members"
//!
//! [roles]
//! "Team Leader" = ["view projects", "view tasks", "reorder task"]
//! ```

use crate::error::DeckError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use taskdeck_policy::{PermissionTable, PolicyConfig, TeamInheritance};

/// Taskdeck configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Max wait for a group or project lock
    pub lock_timeout_ms: u64,
    /// Max duration of one mutation
    pub operation_timeout_ms: u64,
    /// Default look-back window of time reports
    pub report_window_days: u32,
    /// Who inherits a granted team leader's access
    pub team_inheritance: TeamInheritance,
    /// Broadcast buffer of the channel event sink
    pub event_capacity: usize,
    /// Role name to permission names; replaces the default table when set
    pub roles: Option<BTreeMap<String, Vec<String>>>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
            operation_timeout_ms: 10_000,
            report_window_days: 7,
            team_inheritance: TeamInheritance::LeadersOnly,
            event_capacity: 256,
            roles: None,
        }
    }
}

impl DeckConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string
    ///
    /// # Errors
    /// `DeckError::Config` on malformed TOML or unknown role/permission names.
    pub fn from_toml_str(raw: &str) -> Result<Self, DeckError> {
        let config: Self = toml::from_str(raw).map_err(|e| DeckError::Config(e.to_string()))?;
        config.permission_table()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `DeckError::Config` on IO or parse failures.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeckError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DeckError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// With lock timeout
    #[inline]
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With operation timeout
    #[inline]
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With team inheritance rule
    #[inline]
    #[must_use]
    pub fn with_team_inheritance(mut self, rule: TeamInheritance) -> Self {
        self.team_inheritance = rule;
        self
    }

    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    #[must_use]
    pub fn policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            team_inheritance: self.team_inheritance,
        }
    }

    /// Permission table: configured roles, or the built-in defaults
    ///
    /// # Errors
    /// `DeckError::Config` on unknown role or permission names.
    pub fn permission_table(&self) -> Result<PermissionTable, DeckError> {
        match &self.roles {
            Some(roles) => PermissionTable::from_config(roles).map_err(DeckError::from),
            None => Ok(PermissionTable::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Period;
    use taskdeck_model::{Permission, Role};

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DeckConfig::from_toml_str("").unwrap(), DeckConfig::default());
    }

    #[test]
    fn roles_are_normalized() {
        let config = DeckConfig::from_toml_str(
            r#"
            team_inheritance = "all_members"
            [roles]
            "Team_Leader" = ["View Projects", "reorder-task"]
            "#,
        )
        .unwrap();
        assert_eq!(config.team_inheritance, TeamInheritance::AllMembers);

        let table = config.permission_table().unwrap();
        assert_eq!(
            table.permissions_of(Role::TeamLeader),
            [Permission::ViewProjects, Permission::ReorderTask].into()
        );
        assert!(table.permissions_of(Role::Admin).is_empty());
    }

    #[test]
    fn unknown_permission_is_config_error() {
        let err = DeckConfig::from_toml_str("[roles]\nadmin = [\"fly\"]").unwrap_err();
        assert!(matches!(err, DeckError::Config(_)));
    }

    #[test]
    fn any_report_window_resolves() {
        let config = DeckConfig::from_toml_str("report_window_days = 4294967295").unwrap();
        assert_eq!(config.report_window_days, u32::MAX);

        let now = chrono::Utc::now();
        let period = Period::resolve(None, now, config.report_window_days);
        assert!(period.contains(now - chrono::Duration::days(365 * 1000)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskdeck.toml");
        std::fs::write(&path, "lock_timeout_ms = 250\nreport_window_days = 30\n").unwrap();

        let config = DeckConfig::from_file(&path).unwrap();
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.report_window_days, 30);
        assert_eq!(config.operation_timeout_ms, 10_000);
    }
}
