//! Comments and time logs (append-only)

use crate::deck::{active_task, project_row, TaskDeck};
use crate::error::DeckError;
use chrono::Utc;
use taskdeck_model::{Comment, CommentId, TaskId, TimeLog, TimeLogId};
use taskdeck_policy::{Action, Actor, Target};

impl TaskDeck {
    /// Comments on a task, oldest first
    ///
    /// # Errors
    /// `NotFound`, or `Unauthorized` if the task is not visible.
    pub fn comments(&self, actor: &Actor, task: TaskId) -> Result<Vec<Comment>, DeckError> {
        let tables = self.store.read();
        let row = active_task(&tables, task)?;
        let project = project_row(&tables, row.project_id)?;
        self.check(&tables, actor, Action::View, Target::Task(row, project))?;
        Ok(tables.comments_of(task).into_iter().cloned().collect())
    }

    /// Append a comment
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized`, or `Validation` for blank content.
    pub fn add_comment(
        &self,
        actor: &Actor,
        task: TaskId,
        content: &str,
    ) -> Result<Comment, DeckError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DeckError::field("content", "is required"));
        }
        let mut tx = self.store.begin();
        let row = active_task(&tx, task)?;
        let project = project_row(&tx, row.project_id)?;
        self.check(&tx, actor, Action::View, Target::Task(row, project))?;

        let comment = Comment {
            id: CommentId(tx.next_id()),
            task_id: task,
            author_id: actor.user_id,
            content: content.to_owned(),
            created_at: Utc::now(),
        };
        tx.insert_comment(comment.clone())?;
        tx.commit();
        tracing::info!("{} commented on {}", actor.user_id, task);
        Ok(comment)
    }

    /// Log working time on a task
    ///
    /// # Errors
    /// `NotFound`, `Unauthorized`, or `Validation` when `minutes` is zero.
    pub fn log_time(
        &self,
        actor: &Actor,
        task: TaskId,
        minutes: u32,
        billable: bool,
    ) -> Result<TimeLog, DeckError> {
        if minutes == 0 {
            return Err(DeckError::field("minutes", "must be greater than zero"));
        }
        let mut tx = self.store.begin();
        let row = active_task(&tx, task)?;
        let project = project_row(&tx, row.project_id)?;
        self.check(&tx, actor, Action::View, Target::Task(row, project))?;

        let log = TimeLog {
            id: TimeLogId(tx.next_id()),
            task_id: task,
            user_id: actor.user_id,
            minutes,
            billable,
            created_at: Utc::now(),
        };
        tx.insert_time_log(log.clone())?;
        tx.commit();
        tracing::info!("{} logged {}min on {}", actor.user_id, minutes, task);
        Ok(log)
    }
}
