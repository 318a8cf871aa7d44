//! Teams and teammates

use crate::deck::TaskDeck;
use crate::error::DeckError;
use std::collections::BTreeSet;
use taskdeck_model::{Permission, Team, TeamId, User, UserId};
use taskdeck_policy::{Action, Actor};

impl TaskDeck {
    /// Create an empty team
    ///
    /// # Errors
    /// `Unauthorized`, or `Validation` for a blank name.
    pub fn create_team(&self, actor: &Actor, name: &str) -> Result<Team, DeckError> {
        self.require(actor, Action::Create, Permission::ManageTeams)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DeckError::field("name", "is required"));
        }
        let mut tx = self.store.begin();
        let team = Team::new(TeamId(tx.next_id()), name);
        tx.put_team(team.clone())?;
        tx.commit();
        tracing::info!("created {} '{}'", team.id, team.name);
        Ok(team)
    }

    /// Add a user to a team
    ///
    /// # Errors
    /// `Unauthorized` or `NotFound`.
    pub fn add_team_member(&self, actor: &Actor, team: TeamId, user: UserId) -> Result<Team, DeckError> {
        self.edit_team(actor, team, |t| {
            t.members.insert(user);
        })
    }

    /// Remove a user from a team
    ///
    /// # Errors
    /// `Unauthorized` or `NotFound`.
    pub fn remove_team_member(
        &self,
        actor: &Actor,
        team: TeamId,
        user: UserId,
    ) -> Result<Team, DeckError> {
        self.edit_team(actor, team, |t| {
            t.members.remove(&user);
        })
    }

    fn edit_team(
        &self,
        actor: &Actor,
        id: TeamId,
        edit: impl FnOnce(&mut Team),
    ) -> Result<Team, DeckError> {
        self.require(actor, Action::Update, Permission::ManageTeams)?;
        let mut tx = self.store.begin();
        let mut team = tx
            .team(id)
            .cloned()
            .ok_or_else(|| DeckError::not_found("team", id.get()))?;
        edit(&mut team);
        tx.put_team(team.clone())?;
        tx.commit();
        tracing::info!("{} now has {} members", team.id, team.members.len());
        Ok(team)
    }

    /// Teammates of `actor` across all their teams, excluding themselves,
    /// sorted by name
    ///
    /// This is the assignable-user list offered to team leaders.
    #[must_use]
    pub fn team_members(&self, actor: &Actor) -> Vec<User> {
        let tables = self.store.read();
        let ids: BTreeSet<UserId> = actor
            .teams
            .iter()
            .filter_map(|id| tables.team(*id))
            .flat_map(|team| team.members.iter().copied())
            .filter(|id| *id != actor.user_id)
            .collect();
        let mut users: Vec<User> = ids
            .into_iter()
            .filter_map(|id| tables.user(id))
            .filter(|u| u.archival.is_active())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        users
    }
}
