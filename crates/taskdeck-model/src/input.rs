//! Mutation inputs with field-level validation

use crate::entity::{Attachment, Pricing};
use crate::error::{FieldError, ModelError};
use crate::id::{ClientCompanyId, LabelId, TaskGroupId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest accepted project or task name, in characters
pub const MAX_NAME_LEN: usize = 255;

fn check_name(field: &str, name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(FieldError::new(
            field,
            format!("may not be longer than {MAX_NAME_LEN} characters"),
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), ModelError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ModelError::Validation(errors))
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Required; optional in the type so a missing value reports as a field error
    #[serde(default)]
    pub client_company_id: Option<ClientCompanyId>,
    /// Team leader granted access on creation
    #[serde(default)]
    pub team_leader_id: Option<UserId>,
    #[serde(default)]
    pub rate: Option<u64>,
}

impl NewProject {
    /// Create input for a company project
    #[must_use]
    pub fn new(name: impl Into<String>, company: ClientCompanyId) -> Self {
        Self {
            name: name.into(),
            client_company_id: Some(company),
            ..Self::default()
        }
    }

    /// Grant a team leader on creation
    #[must_use]
    pub fn with_team_leader(mut self, leader: UserId) -> Self {
        self.team_leader_id = Some(leader);
        self
    }

    /// Validate all fields
    ///
    /// # Errors
    /// `ModelError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut errors = Vec::new();
        check_name("name", &self.name, &mut errors);
        if self.client_company_id.is_none() {
            errors.push(FieldError::new("client_company_id", "company is required"));
        }
        finish(errors)
    }
}

/// Partial project update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_company_id: Option<ClientCompanyId>,
    /// Becomes the only granted team leader
    #[serde(default)]
    pub team_leader_id: Option<UserId>,
}

impl ProjectUpdate {
    /// Validate supplied fields
    ///
    /// # Errors
    /// `ModelError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name("name", name, &mut errors);
        }
        finish(errors)
    }
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    /// Required; optional in the type so a missing value reports as a field error
    #[serde(default)]
    pub group_id: Option<TaskGroupId>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub subscribers: BTreeSet<UserId>,
    #[serde(default)]
    pub labels: BTreeSet<LabelId>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default = "default_true")]
    pub billable: bool,
    #[serde(default)]
    pub pricing: Pricing,
}

fn default_true() -> bool {
    true
}

impl NewTask {
    /// Create input for a task in `group`
    #[must_use]
    pub fn new(name: impl Into<String>, group: TaskGroupId) -> Self {
        Self {
            name: name.into(),
            group_id: Some(group),
            assigned_to: None,
            description: None,
            due_on: None,
            subscribers: BTreeSet::new(),
            labels: BTreeSet::new(),
            attachments: Vec::new(),
            billable: true,
            pricing: Pricing::Hourly,
        }
    }

    /// Assign on creation
    #[must_use]
    pub fn assigned_to(mut self, user: UserId) -> Self {
        self.assigned_to = Some(user);
        self
    }

    /// Set due date
    #[must_use]
    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_on = Some(date);
        self
    }

    /// Subscribe a user
    #[must_use]
    pub fn subscriber(mut self, user: UserId) -> Self {
        self.subscribers.insert(user);
        self
    }

    /// Set pricing
    #[must_use]
    pub fn priced(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Validate all fields
    ///
    /// # Errors
    /// `ModelError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut errors = Vec::new();
        check_name("name", &self.name, &mut errors);
        if self.group_id.is_none() {
            errors.push(FieldError::new("group_id", "task group is required"));
        }
        finish(errors)
    }
}

/// Partial task update; `None` leaves a field unchanged
///
/// Nullable fields use `Option<Option<_>>`: `Some(None)` clears the value.
/// Group membership is not editable here, only through a move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub assigned_to: Option<Option<UserId>>,
    #[serde(default)]
    pub due_on: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub labels: Option<BTreeSet<LabelId>>,
    #[serde(default)]
    pub subscribers: Option<BTreeSet<UserId>>,
    #[serde(default)]
    pub billable: Option<bool>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
}

impl TaskUpdate {
    /// Validate supplied fields
    ///
    /// # Errors
    /// `ModelError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name("name", name, &mut errors);
        }
        finish(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_requires_name_and_group() {
        let input = NewTask {
            group_id: None,
            ..NewTask::new("  ", TaskGroupId(1))
        };
        let Err(ModelError::Validation(fields)) = input.validate() else {
            panic!("expected validation failure");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, ["name", "group_id"]);
    }

    #[test]
    fn new_task_name_length() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(NewTask::new(long, TaskGroupId(1)).validate().is_err());
        let ok = "x".repeat(MAX_NAME_LEN);
        assert!(NewTask::new(ok, TaskGroupId(1)).validate().is_ok());
    }

    #[test]
    fn new_project_requires_company() {
        let input = NewProject {
            name: "Website".into(),
            ..NewProject::default()
        };
        let err = input.validate().unwrap_err();
        assert!(err.to_string().contains("client_company_id"));
        assert!(NewProject::new("Website", ClientCompanyId(1)).validate().is_ok());
    }

    #[test]
    fn task_update_only_checks_supplied_fields() {
        assert!(TaskUpdate::default().validate().is_ok());
        let update = TaskUpdate {
            name: Some(String::new()),
            ..TaskUpdate::default()
        };
        assert!(update.validate().is_err());
    }
}
