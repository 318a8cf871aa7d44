//! Label catalog
//!
//! The catalog is fixed to the default labels. Listing heals it first, so
//! rogue rows never reach a caller.

use crate::deck::TaskDeck;
use crate::error::DeckError;
use taskdeck_model::{normalize_color, Label, LabelId, Permission};
use taskdeck_policy::{Action, Actor};

impl TaskDeck {
    /// Reset the catalog, then list it by name
    ///
    /// # Errors
    /// `Unauthorized` without the view-tasks permission.
    pub fn list_labels(&self, actor: &Actor) -> Result<Vec<Label>, DeckError> {
        self.require(actor, Action::View, Permission::ViewTasks)?;
        let mut tx = self.store.begin();
        tx.reset_labels()?;
        let mut labels: Vec<Label> = tx.labels().filter(|l| l.archival.is_active()).cloned().collect();
        tx.commit();
        labels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(labels)
    }

    /// Change a label's colour (`#RRGGBB`)
    ///
    /// # Errors
    /// `Unauthorized`, `NotFound` or `Validation` on the colour.
    pub fn update_label_color(
        &self,
        actor: &Actor,
        id: LabelId,
        color: &str,
    ) -> Result<Label, DeckError> {
        self.require(actor, Action::Update, Permission::ManageLabels)?;
        let color = normalize_color(color)?;
        let mut tx = self.store.begin();
        let label = tx.set_label_color(id, color)?;
        tx.commit();
        tracing::info!("label '{}' colour set to {}", label.name, label.color);
        Ok(label)
    }

    /// Always refused: the catalog is fixed
    ///
    /// # Errors
    /// `Validation` on `name`.
    pub fn create_label(&self, actor: &Actor, name: &str) -> Result<Label, DeckError> {
        self.require(actor, Action::Create, Permission::ManageLabels)?;
        Err(DeckError::field(
            "name",
            format!("label '{name}' cannot be created; the label catalog is fixed"),
        ))
    }

    /// Always refused: the catalog is fixed
    ///
    /// # Errors
    /// `Validation` on `id`.
    pub fn delete_label(&self, actor: &Actor, id: LabelId) -> Result<(), DeckError> {
        self.require(actor, Action::Archive, Permission::ManageLabels)?;
        Err(DeckError::field(
            "id",
            format!("{id} cannot be deleted; the label catalog is fixed"),
        ))
    }
}
