//! Project Access Registry
//!
//! Explicit (user, project) grants, replaced in bulk. A replacement runs
//! under the project's grant lock inside one store transaction: readers see
//! either the old grant set or the new one, never a mix.

use crate::deck::{project_row, TaskDeck};
use crate::error::DeckError;
use std::collections::BTreeSet;
use taskdeck_model::{ProjectId, User, UserId};
use taskdeck_policy::{Action, Actor, Target};

impl TaskDeck {
    /// Users explicitly granted access to a project
    ///
    /// # Errors
    /// `NotFound`, or `Unauthorized` without the edit-user-access permission.
    pub fn project_access(&self, actor: &Actor, id: ProjectId) -> Result<Vec<User>, DeckError> {
        let tables = self.store.read();
        let project = project_row(&tables, id)?;
        self.check(&tables, actor, Action::EditUserAccess, Target::Project(project))?;
        Ok(tables
            .grantees(id)
            .into_iter()
            .filter_map(|user| tables.user(user).cloned())
            .collect())
    }

    /// Replace every grant of a project with `users`
    ///
    /// Duplicates are ignored and an empty set clears all grants. An unknown
    /// user id fails the whole replacement and leaves the previous grants in
    /// place.
    ///
    /// # Errors
    /// `Unauthorized`, `NotFound` (project or user), `ConcurrencyConflict`
    /// when the project's grant lock is busy, `Timeout`.
    pub async fn replace_project_access(
        &self,
        actor: &Actor,
        id: ProjectId,
        users: impl IntoIterator<Item = UserId>,
    ) -> Result<BTreeSet<UserId>, DeckError> {
        let users: BTreeSet<UserId> = users.into_iter().collect();
        {
            let tables = self.store.read();
            let project = project_row(&tables, id)?;
            self.check(&tables, actor, Action::EditUserAccess, Target::Project(project))?;
        }

        self.bounded(async {
            let _lock = self.grant_locks.acquire(id, self.config.lock_timeout()).await?;
            let mut tx = self.store.begin();
            let removed = tx.delete_grants(id);
            for user in &users {
                tx.insert_grant(id, *user)?;
            }
            tx.commit();

            tracing::info!(
                "replaced access on {}: {} grants -> {} grants (by {})",
                id,
                removed.len(),
                users.len(),
                actor.user_id
            );
            Ok(users.clone())
        })
        .await
    }
}
