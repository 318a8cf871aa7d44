//! Label catalog maintenance

use crate::error::StoreError;
use crate::transaction::Transaction;
use taskdeck_model::{Archival, Label, LabelId, DEFAULT_LABELS};

/// What a catalog reset changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReset {
    /// Non-default labels deleted
    pub removed: Vec<String>,
    /// Default labels created because they were missing
    pub created: Vec<String>,
    /// Default labels brought back from the archive
    pub restored: Vec<String>,
}

impl LabelReset {
    /// Catalog was already exact
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.created.is_empty() && self.restored.is_empty()
    }
}

impl Transaction<'_> {
    /// Force the catalog back to exactly the default labels
    ///
    /// Deleted labels are also detached from every task carrying them.
    ///
    /// # Errors
    /// `StoreError` if a task or label vanished mid-reset; dropping the
    /// transaction then undoes the partial reset.
    pub fn reset_labels(&mut self) -> Result<LabelReset, StoreError> {
        let mut reset = LabelReset::default();

        let rogue: Vec<(LabelId, String)> = self
            .labels()
            .filter(|l| !l.is_default())
            .map(|l| (l.id, l.name.clone()))
            .collect();
        for (id, name) in rogue {
            let carriers: Vec<_> = self
                .tasks()
                .filter(|t| t.labels.contains(&id))
                .map(|t| t.id)
                .collect();
            for task in carriers {
                self.update_task(task, |t| t.labels.remove(&id))?;
            }
            self.remove_label(id)?;
            reset.removed.push(name);
        }

        for (name, color) in DEFAULT_LABELS {
            match self.label_named(name).cloned() {
                Some(mut label) if !label.archival.is_active() => {
                    label.archival.restore();
                    self.put_label(label);
                    reset.restored.push(name.to_owned());
                }
                Some(_) => {}
                None => {
                    let id = LabelId(self.next_id());
                    self.put_label(Label {
                        id,
                        name: name.to_owned(),
                        color: color.to_owned(),
                        archival: Archival::active(),
                    });
                    reset.created.push(name.to_owned());
                }
            }
        }

        if !reset.is_noop() {
            tracing::info!(
                "label catalog reset: removed {:?}, created {:?}, restored {:?}",
                reset.removed,
                reset.created,
                reset.restored
            );
        }
        Ok(reset)
    }

    /// Change a label's colour; the name never changes
    ///
    /// # Errors
    /// `StoreError::NotFound` for an unknown label.
    pub fn set_label_color(&mut self, id: LabelId, color: String) -> Result<Label, StoreError> {
        let mut label = self
            .label(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("label", id.get()))?;
        label.color = color;
        self.put_label(label.clone());
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::Utc;
    use taskdeck_model::{Project, ProjectId, Task, TaskId, UserId};

    #[test]
    fn reset_heals_catalog() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        tx.put_project(Project::new(ProjectId(1), "Apollo", Utc::now()));
        tx.put_label(Label {
            id: LabelId(2),
            name: "Urgent".into(),
            color: "#000000".into(),
            archival: Archival::active(),
        });
        let mut task = Task::new(TaskId(3), ProjectId(1), None, "t", UserId(1), Utc::now());
        task.labels.insert(LabelId(2));
        tx.put_task(task).unwrap();

        let reset = tx.reset_labels().unwrap();
        assert_eq!(reset.removed, vec!["Urgent".to_owned()]);
        assert_eq!(reset.created.len(), 3);
        assert!(tx.task(TaskId(3)).unwrap().labels.is_empty());

        let mut names: Vec<_> = tx.labels().map(|l| l.name.clone()).collect();
        names.sort();
        assert_eq!(names, ["Completed", "In Progress", "Incomplete"]);

        assert!(tx.reset_labels().unwrap().is_noop());
        tx.commit();
    }

    #[test]
    fn colour_change_keeps_name() {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        tx.reset_labels().unwrap();
        let id = tx.label_named("Completed").unwrap().id;
        let label = tx.set_label_color(id, "#111111".into()).unwrap();
        assert_eq!(label.name, "Completed");
        assert_eq!(tx.label(id).unwrap().color, "#111111");
        assert!(tx.set_label_color(LabelId(999), "#111111".into()).is_err());
    }
}
