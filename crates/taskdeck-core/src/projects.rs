//! Project lifecycle and listings

use crate::deck::{active_project, project_row, TaskDeck};
use crate::error::DeckError;
use chrono::Utc;
use serde::Serialize;
use taskdeck_model::{
    ArchiveFilter, Permission, Project, ProjectId, ProjectUpdate, NewProject, Role, TaskGroup,
    TaskGroupId, UserId, DEFAULT_TASK_GROUPS,
};
use taskdeck_policy::{Action, Actor, Target};
use taskdeck_store::{Tables, Transaction};

/// Project as listed for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    /// Pinned by the viewing user
    pub favorite: bool,
}

impl TaskDeck {
    /// Projects `actor` can access, favorites first, then by name
    ///
    /// # Errors
    /// `Unauthorized` without the view-projects permission.
    pub fn list_accessible_projects(
        &self,
        actor: &Actor,
        filter: ArchiveFilter,
    ) -> Result<Vec<ProjectSummary>, DeckError> {
        self.require(actor, Action::View, Permission::ViewProjects)?;
        let tables = self.store.read();
        let scope = self.scope_in(&tables, actor);

        let mut projects: Vec<ProjectSummary> = tables
            .projects()
            .filter(|p| filter.admits(&p.archival) && scope.admits_project(p.id))
            .map(|p| ProjectSummary {
                favorite: tables.is_favorite(actor.user_id, p.id),
                project: p.clone(),
            })
            .collect();
        projects.sort_by(|a, b| {
            b.favorite
                .cmp(&a.favorite)
                .then_with(|| a.project.name.to_lowercase().cmp(&b.project.name.to_lowercase()))
                .then_with(|| a.project.id.cmp(&b.project.id))
        });
        Ok(projects)
    }

    /// One project
    ///
    /// # Errors
    /// `NotFound`, or `Unauthorized` without access.
    pub fn project(&self, actor: &Actor, id: ProjectId) -> Result<Project, DeckError> {
        let tables = self.store.read();
        let project = project_row(&tables, id)?;
        self.check(&tables, actor, Action::View, Target::Project(project))?;
        Ok(project.clone())
    }

    /// Task groups of a project by position
    ///
    /// # Errors
    /// `NotFound`, or `Unauthorized` without access.
    pub fn task_groups(&self, actor: &Actor, id: ProjectId) -> Result<Vec<TaskGroup>, DeckError> {
        let tables = self.store.read();
        let project = active_project(&tables, id)?;
        self.check(&tables, actor, Action::View, Target::Project(project))?;
        Ok(tables.groups_of(id).into_iter().cloned().collect())
    }

    /// Create a project with the default task groups
    ///
    /// # Errors
    /// `Unauthorized`, or `Validation` for a missing name or company, an
    /// unknown company, or a team leader without the team leader role.
    pub async fn create_project(
        &self,
        actor: &Actor,
        input: NewProject,
    ) -> Result<Project, DeckError> {
        self.require(actor, Action::Create, Permission::CreateProject)?;
        input.validate()?;

        self.bounded(async {
            let mut tx = self.store.begin();
            let company = input
                .client_company_id
                .ok_or_else(|| DeckError::field("client_company_id", "company is required"))?;
            if tx.company(company).is_none() {
                return Err(DeckError::field("client_company_id", "company does not exist"));
            }
            if let Some(leader) = input.team_leader_id {
                check_team_leader(&tx, leader)?;
            }

            let mut project = Project::new(ProjectId(tx.next_id()), input.name.trim(), Utc::now())
                .with_company(company);
            project.description = input.description.clone();
            project.rate = input.rate;
            tx.put_project(project.clone());

            for (position, name) in (0u32..).zip(DEFAULT_TASK_GROUPS) {
                let id = TaskGroupId(tx.next_id());
                tx.put_group(TaskGroup::new(id, project.id, name, position))?;
            }
            if let Some(leader) = input.team_leader_id {
                tx.insert_grant(project.id, leader)?;
            }
            tx.commit();

            tracing::info!("created {} '{}' for {}", project.id, project.name, actor.user_id);
            Ok(project)
        })
        .await
    }

    /// Edit a project
    ///
    /// A supplied team leader becomes the only granted team leader; other
    /// grants are kept.
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized` or `Validation`.
    pub async fn update_project(
        &self,
        actor: &Actor,
        id: ProjectId,
        update: ProjectUpdate,
    ) -> Result<Project, DeckError> {
        update.validate()?;
        self.bounded(async {
            let _grants = self.grant_locks.acquire(id, self.config.lock_timeout()).await?;
            let mut tx = self.store.begin();
            let mut project = active_project(&tx, id)?.clone();
            self.check(&tx, actor, Action::Update, Target::Project(&project))?;

            if let Some(name) = &update.name {
                project.name = name.trim().to_owned();
            }
            if let Some(description) = &update.description {
                project.description = Some(description.clone());
            }
            if let Some(company) = update.client_company_id {
                if tx.company(company).is_none() {
                    return Err(DeckError::field("client_company_id", "company does not exist"));
                }
                project.client_company_id = Some(company);
            }
            tx.put_project(project.clone());

            if let Some(leader) = update.team_leader_id {
                check_team_leader(&tx, leader)?;
                replace_team_leader(&mut tx, id, leader)?;
            }
            tx.commit();

            tracing::info!("updated {} by {}", id, actor.user_id);
            Ok(project)
        })
        .await
    }

    /// Soft-archive a project
    ///
    /// # Errors
    /// `NotFound` or `Unauthorized`.
    pub async fn archive_project(&self, actor: &Actor, id: ProjectId) -> Result<Project, DeckError> {
        self.set_project_archived(actor, id, true).await
    }

    /// Restore an archived project
    ///
    /// # Errors
    /// `NotFound` or `Unauthorized`.
    pub async fn restore_project(&self, actor: &Actor, id: ProjectId) -> Result<Project, DeckError> {
        self.set_project_archived(actor, id, false).await
    }

    async fn set_project_archived(
        &self,
        actor: &Actor,
        id: ProjectId,
        archived: bool,
    ) -> Result<Project, DeckError> {
        let action = if archived { Action::Archive } else { Action::Restore };
        self.bounded(async {
            let mut tx = self.store.begin();
            let mut project = project_row(&tx, id)?.clone();
            self.check(&tx, actor, action, Target::Project(&project))?;
            if archived {
                project.archival.archive(Utc::now());
            } else {
                project.archival.restore();
            }
            tx.put_project(project.clone());
            tx.commit();
            tracing::info!("{} {} by {}", action, id, actor.user_id);
            Ok(project)
        })
        .await
    }

    /// Flip the favorite flag of a project for `actor`; returns the new state
    ///
    /// # Errors
    /// `NotFound` or `Unauthorized`.
    pub async fn toggle_favorite(&self, actor: &Actor, id: ProjectId) -> Result<bool, DeckError> {
        self.bounded(async {
            let mut tx = self.store.begin();
            let project = project_row(&tx, id)?;
            self.check(&tx, actor, Action::View, Target::Project(project))?;
            let favorite = !tx.is_favorite(actor.user_id, id);
            tx.set_favorite(actor.user_id, id, favorite);
            tx.commit();
            Ok(favorite)
        })
        .await
    }
}

fn check_team_leader(tables: &Tables, leader: UserId) -> Result<(), DeckError> {
    match tables.user(leader) {
        Some(user) if user.has_role(Role::TeamLeader) => Ok(()),
        Some(_) => Err(DeckError::field("team_leader_id", "user is not a team leader")),
        None => Err(DeckError::field("team_leader_id", "user does not exist")),
    }
}

fn replace_team_leader(
    tx: &mut Transaction<'_>,
    project: ProjectId,
    leader: UserId,
) -> Result<(), DeckError> {
    let previous = tx.delete_grants(project);
    for user in previous {
        let is_leader = tx.user(user).is_some_and(|u| u.has_role(Role::TeamLeader));
        if !is_leader {
            tx.insert_grant(project, user)?;
        }
    }
    tx.insert_grant(project, leader)?;
    Ok(())
}
