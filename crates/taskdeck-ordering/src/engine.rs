//! The ordering engine
//!
//! Every public operation follows the same shape: take the group lock(s),
//! open one store transaction, validate the full sequence, rewrite ranks
//! (and group references for a move), bump group versions, commit. Any
//! error before the commit drops the transaction and with it every write.

use crate::error::OrderError;
use crate::order_set::{
    displacement, insert_at, validate_destination, validate_full_order, with_hidden, without_hidden,
};
use std::collections::BTreeSet;
use std::time::Duration;
use taskdeck_model::{ArchiveFilter, DomainEvent, Task, TaskGroup, TaskGroupId, TaskId};
use taskdeck_store::{KeyedLocks, MemoryStore, Transaction};

/// Reorder the tasks of one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest {
    /// Group to reorder
    pub group_id: TaskGroupId,
    /// Every active (visible) task of the group, in the new order
    pub ordered: Vec<TaskId>,
    /// Reject if the group's version moved on
    pub expected_version: Option<u64>,
}

impl ReorderRequest {
    #[must_use]
    pub fn new(group_id: TaskGroupId, ordered: Vec<TaskId>) -> Self {
        Self {
            group_id,
            ordered,
            expected_version: None,
        }
    }

    /// Require the group to still be at `version`
    #[inline]
    #[must_use]
    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Move tasks from one group into another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    /// Group the tasks leave
    pub from_group: TaskGroupId,
    /// Group the tasks join
    pub to_group: TaskGroupId,
    /// The destination's full new order, including the moved tasks
    pub ordered: Vec<TaskId>,
    /// Reject if the destination group's version moved on
    pub expected_version: Option<u64>,
}

impl MoveRequest {
    #[must_use]
    pub fn new(from_group: TaskGroupId, to_group: TaskGroupId, ordered: Vec<TaskId>) -> Self {
        Self {
            from_group,
            to_group,
            ordered,
            expected_version: None,
        }
    }

    /// Require the destination group to still be at `version`
    #[inline]
    #[must_use]
    pub fn with_expected_version(mut self, version: u64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Committed result of a reorder or move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderChange {
    /// Event to publish
    pub event: DomainEvent,
    /// Final order of the (destination) group, visible tasks only
    pub order: Vec<TaskId>,
    /// New version of the (destination) group
    pub version: u64,
}

/// Filter naming the tasks a caller may order
pub type Visible<'a> = &'a (dyn Fn(&Task) -> bool + Sync);

fn everything(_: &Task) -> bool {
    true
}

/// Serialized, all-or-nothing task ordering
#[derive(Debug)]
pub struct OrderingEngine {
    locks: KeyedLocks<TaskGroupId>,
    lock_timeout: Duration,
}

impl Default for OrderingEngine {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl OrderingEngine {
    /// Create engine waiting at most `lock_timeout` for a group lock
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            locks: KeyedLocks::new(),
            lock_timeout,
        }
    }

    /// Rewrite ranks of one group to match `request.ordered`
    ///
    /// # Errors
    /// - `InvalidOrderSet` on duplicates, foreign or missing ids
    /// - `GroupNotFound`, `VersionConflict`, lock timeout
    pub async fn reorder(
        &self,
        store: &MemoryStore,
        request: ReorderRequest,
    ) -> Result<OrderChange, OrderError> {
        self.reorder_visible(store, request, &everything).await
    }

    /// [`reorder`](Self::reorder) over the tasks `visible` admits
    ///
    /// Other tasks keep their positions and never appear in errors.
    ///
    /// # Errors
    /// As [`reorder`](Self::reorder).
    pub async fn reorder_visible(
        &self,
        store: &MemoryStore,
        request: ReorderRequest,
        visible: Visible<'_>,
    ) -> Result<OrderChange, OrderError> {
        let _guard = self.locks.acquire(request.group_id, self.lock_timeout).await?;
        let mut tx = store.begin();
        let change = apply_reorder(
            &mut tx,
            request.group_id,
            &request.ordered,
            request.expected_version,
            visible,
        )?;
        tx.commit();
        Ok(change)
    }

    /// Move the source tasks listed in `request.ordered` into the destination
    ///
    /// The moved tasks take their place in the destination sequence; the
    /// source group is renumbered without them. A move within one group is
    /// a reorder.
    ///
    /// # Errors
    /// As [`reorder`](Self::reorder), plus `CrossProject`.
    pub async fn move_tasks(
        &self,
        store: &MemoryStore,
        request: MoveRequest,
    ) -> Result<OrderChange, OrderError> {
        self.move_tasks_visible(store, request, &everything).await
    }

    /// [`move_tasks`](Self::move_tasks) over the tasks `visible` admits
    ///
    /// # Errors
    /// As [`move_tasks`](Self::move_tasks).
    pub async fn move_tasks_visible(
        &self,
        store: &MemoryStore,
        request: MoveRequest,
        visible: Visible<'_>,
    ) -> Result<OrderChange, OrderError> {
        if request.from_group == request.to_group {
            let reorder = ReorderRequest {
                group_id: request.to_group,
                ordered: request.ordered,
                expected_version: request.expected_version,
            };
            return self.reorder_visible(store, reorder, visible).await;
        }

        let _guards = self
            .locks
            .acquire_all([request.from_group, request.to_group], self.lock_timeout)
            .await?;
        let mut tx = store.begin();
        let change = apply_move(
            &mut tx,
            request.from_group,
            request.to_group,
            &request.ordered,
            request.expected_version,
            visible,
        )?;
        tx.commit();
        Ok(change)
    }

    /// Move one task to `to_index` of `to_group`
    ///
    /// The destination order is computed under the group locks, so the
    /// caller only names a position.
    ///
    /// # Errors
    /// `TaskNotFound` if the task is not an active member of `from_group`,
    /// otherwise as [`move_tasks`](Self::move_tasks).
    pub async fn move_task(
        &self,
        store: &MemoryStore,
        task: TaskId,
        from_group: TaskGroupId,
        to_group: TaskGroupId,
        to_index: usize,
    ) -> Result<OrderChange, OrderError> {
        self.move_task_visible(store, task, from_group, to_group, to_index, &everything)
            .await
    }

    /// [`move_task`](Self::move_task) with `to_index` counted over the
    /// tasks `visible` admits
    ///
    /// # Errors
    /// As [`move_task`](Self::move_task); a task `visible` refuses is
    /// `TaskNotFound`.
    pub async fn move_task_visible(
        &self,
        store: &MemoryStore,
        task: TaskId,
        from_group: TaskGroupId,
        to_group: TaskGroupId,
        to_index: usize,
        visible: Visible<'_>,
    ) -> Result<OrderChange, OrderError> {
        let _guards = self
            .locks
            .acquire_all([from_group, to_group], self.lock_timeout)
            .await?;
        let mut tx = store.begin();
        let source = group_of(&tx, from_group)?;
        let movable = tx
            .group_tasks(source.id, ArchiveFilter::Active)
            .into_iter()
            .any(|t| t.id == task && visible(t));
        if !movable {
            return Err(OrderError::TaskNotFound(task));
        }

        let destination = group_of(&tx, to_group)?.id;
        let shown = without_hidden(&tx.group_order(destination), &hidden_in(&tx, destination, visible));
        let ordered = insert_at(&shown, task, to_index);
        let change = if from_group == to_group {
            apply_reorder(&mut tx, to_group, &ordered, None, visible)?
        } else {
            apply_move(&mut tx, from_group, to_group, &ordered, None, visible)?
        };
        tx.commit();
        Ok(change)
    }
}

fn group_of(tx: &Transaction<'_>, id: TaskGroupId) -> Result<TaskGroup, OrderError> {
    tx.group(id).cloned().ok_or(OrderError::GroupNotFound(id))
}

/// Active tasks of `group` that `visible` refuses
fn hidden_in(tx: &Transaction<'_>, group: TaskGroupId, visible: Visible<'_>) -> BTreeSet<TaskId> {
    tx.group_tasks(group, ArchiveFilter::Active)
        .into_iter()
        .filter(|t| !visible(*t))
        .map(|t| t.id)
        .collect()
}

fn check_version(group: &TaskGroup, expected: Option<u64>) -> Result<(), OrderError> {
    match expected {
        Some(expected) if expected != group.version => {
            tracing::warn!(
                "stale order for {}: expected version {}, found {}",
                group.id,
                expected,
                group.version
            );
            Err(OrderError::VersionConflict {
                group: group.id,
                expected,
                actual: group.version,
            })
        }
        _ => Ok(()),
    }
}

fn rank(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

fn renumber(
    tx: &mut Transaction<'_>,
    group: TaskGroupId,
    ordered: &[TaskId],
) -> Result<u64, OrderError> {
    for (index, id) in ordered.iter().enumerate() {
        tx.update_task(*id, |task| {
            task.group_id = Some(group);
            task.rank = rank(index);
        })?;
    }
    Ok(tx.update_group(group, |g| {
        g.version += 1;
        g.version
    })?)
}

fn apply_reorder(
    tx: &mut Transaction<'_>,
    group_id: TaskGroupId,
    ordered: &[TaskId],
    expected_version: Option<u64>,
    visible: Visible<'_>,
) -> Result<OrderChange, OrderError> {
    let group = group_of(tx, group_id)?;
    check_version(&group, expected_version)?;

    let current = tx.group_order(group_id);
    let hidden = hidden_in(tx, group_id, visible);
    validate_full_order(&without_hidden(&current, &hidden), ordered).map_err(|v| {
        tracing::warn!("rejected reorder of {}: {}", group_id, v);
        OrderError::invalid(group_id, v)
    })?;

    let full = with_hidden(&current, &hidden, ordered);
    let version = renumber(tx, group_id, &full)?;
    let (from_index, to_index) = displacement(&current, &full);
    tracing::info!(
        "reordered {} tasks in {} (version {})",
        ordered.len(),
        group_id,
        version
    );

    Ok(OrderChange {
        event: DomainEvent::TaskOrderChanged {
            project_id: group.project_id,
            group_id,
            from_index,
            to_index,
        },
        order: ordered.to_vec(),
        version,
    })
}

fn apply_move(
    tx: &mut Transaction<'_>,
    from_group: TaskGroupId,
    to_group: TaskGroupId,
    ordered: &[TaskId],
    expected_version: Option<u64>,
    visible: Visible<'_>,
) -> Result<OrderChange, OrderError> {
    let source = group_of(tx, from_group)?;
    let destination = group_of(tx, to_group)?;
    if source.project_id != destination.project_id {
        return Err(OrderError::CrossProject {
            from: from_group,
            to: to_group,
        });
    }
    check_version(&destination, expected_version)?;

    let source_order = tx.group_order(from_group);
    let destination_order = tx.group_order(to_group);
    let destination_hidden = hidden_in(tx, to_group, visible);
    let moved = validate_destination(
        &without_hidden(&destination_order, &destination_hidden),
        &without_hidden(&source_order, &hidden_in(tx, from_group, visible)),
        ordered,
    )
    .map_err(|v| {
        tracing::warn!("rejected move {} -> {}: {}", from_group, to_group, v);
        OrderError::invalid(to_group, v)
    })?;

    let remaining: Vec<TaskId> = source_order
        .iter()
        .copied()
        .filter(|id| !moved.contains(id))
        .collect();
    let full = with_hidden(&destination_order, &destination_hidden, ordered);
    let version = renumber(tx, to_group, &full)?;
    renumber(tx, from_group, &remaining)?;

    let first = moved[0];
    let from_index = source_order.iter().position(|id| *id == first).unwrap_or(0);
    let to_index = full.iter().position(|id| *id == first).unwrap_or(0);
    tracing::info!(
        "moved {} tasks {} -> {} (version {})",
        moved.len(),
        from_group,
        to_group,
        version
    );

    Ok(OrderChange {
        event: DomainEvent::TaskGroupChanged {
            project_id: destination.project_id,
            from_group_id: from_group,
            to_group_id: to_group,
            from_index,
            to_index,
        },
        order: ordered.to_vec(),
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskdeck_model::{Project, ProjectId, Task, TaskGroup, UserId};

    fn board(tasks_per_group: &[(u64, &[u64])]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut tx = store.begin();
        tx.put_project(Project::new(ProjectId(1), "Apollo", Utc::now()));
        for (position, (group, tasks)) in tasks_per_group.iter().enumerate() {
            tx.put_group(TaskGroup::new(TaskGroupId(*group), ProjectId(1), "g", rank(position)))
                .unwrap();
            for (index, id) in tasks.iter().enumerate() {
                let mut task = Task::new(
                    TaskId(*id),
                    ProjectId(1),
                    Some(TaskGroupId(*group)),
                    "t",
                    UserId(1),
                    Utc::now(),
                );
                task.rank = rank(index);
                tx.put_task(task).unwrap();
            }
        }
        tx.commit();
        store
    }

    fn order(store: &MemoryStore, group: u64) -> Vec<u64> {
        store
            .read()
            .group_order(TaskGroupId(group))
            .into_iter()
            .map(TaskId::get)
            .collect()
    }

    fn ids(raw: &[u64]) -> Vec<TaskId> {
        raw.iter().map(|r| TaskId(*r)).collect()
    }

    #[tokio::test]
    async fn reorder_rewrites_dense_ranks() {
        let store = board(&[(10, &[1, 2, 3])]);
        let engine = OrderingEngine::default();

        let change = engine
            .reorder(&store, ReorderRequest::new(TaskGroupId(10), ids(&[3, 1, 2])))
            .await
            .unwrap();

        assert_eq!(order(&store, 10), vec![3, 1, 2]);
        let ranks: Vec<u32> = store
            .read()
            .group_tasks(TaskGroupId(10), taskdeck_model::ArchiveFilter::Active)
            .iter()
            .map(|t| t.rank)
            .collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert_eq!(change.version, 1);
        assert_eq!(
            change.event,
            DomainEvent::TaskOrderChanged {
                project_id: ProjectId(1),
                group_id: TaskGroupId(10),
                from_index: 2,
                to_index: 0,
            }
        );
    }

    #[tokio::test]
    async fn stale_version_is_conflict() {
        let store = board(&[(10, &[1, 2])]);
        let engine = OrderingEngine::default();
        engine
            .reorder(&store, ReorderRequest::new(TaskGroupId(10), ids(&[2, 1])))
            .await
            .unwrap();

        let err = engine
            .reorder(
                &store,
                ReorderRequest::new(TaskGroupId(10), ids(&[1, 2])).with_expected_version(0),
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(order(&store, 10), vec![2, 1]);
    }

    #[tokio::test]
    async fn move_renumbers_both_groups() {
        let store = board(&[(10, &[1, 2, 3]), (20, &[4, 5])]);
        let engine = OrderingEngine::default();

        let change = engine
            .move_tasks(
                &store,
                MoveRequest::new(TaskGroupId(10), TaskGroupId(20), ids(&[4, 2, 5])),
            )
            .await
            .unwrap();

        assert_eq!(order(&store, 20), vec![4, 2, 5]);
        assert_eq!(order(&store, 10), vec![1, 3]);
        let t = store.read();
        assert_eq!(t.task(TaskId(2)).unwrap().group_id, Some(TaskGroupId(20)));
        assert_eq!(t.task(TaskId(3)).unwrap().rank, 1);
        assert_eq!(t.group(TaskGroupId(10)).unwrap().version, 1);
        assert_eq!(
            change.event,
            DomainEvent::TaskGroupChanged {
                project_id: ProjectId(1),
                from_group_id: TaskGroupId(10),
                to_group_id: TaskGroupId(20),
                from_index: 1,
                to_index: 1,
            }
        );
    }

    #[tokio::test]
    async fn move_task_places_at_index() {
        let store = board(&[(10, &[1, 2]), (20, &[4, 5])]);
        let engine = OrderingEngine::default();

        engine
            .move_task(&store, TaskId(1), TaskGroupId(10), TaskGroupId(20), 99)
            .await
            .unwrap();
        assert_eq!(order(&store, 20), vec![4, 5, 1]);
        assert_eq!(order(&store, 10), vec![2]);

        engine
            .move_task(&store, TaskId(1), TaskGroupId(20), TaskGroupId(20), 0)
            .await
            .unwrap();
        assert_eq!(order(&store, 20), vec![1, 4, 5]);

        let err = engine
            .move_task(&store, TaskId(1), TaskGroupId(10), TaskGroupId(20), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::TaskNotFound(TaskId(1))));
    }

    #[tokio::test]
    async fn filtered_reorder_keeps_hidden_slots() {
        let store = board(&[(10, &[1, 2, 3]), (20, &[4, 5])]);
        let engine = OrderingEngine::default();
        let not_two = |t: &Task| t.id != TaskId(2);

        let change = engine
            .reorder_visible(&store, ReorderRequest::new(TaskGroupId(10), ids(&[3, 1])), &not_two)
            .await
            .unwrap();
        assert_eq!(change.order, ids(&[3, 1]));
        assert_eq!(order(&store, 10), vec![3, 2, 1]);

        let err = engine
            .reorder_visible(&store, ReorderRequest::new(TaskGroupId(10), ids(&[1])), &not_two)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidOrderSet {
                violation: crate::OrderViolation::Missing(TaskId(3)),
                ..
            }
        ));

        let err = engine
            .move_task_visible(&store, TaskId(2), TaskGroupId(10), TaskGroupId(20), 0, &not_two)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::TaskNotFound(TaskId(2))));
        assert_eq!(order(&store, 10), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn move_across_projects_rejected() {
        let store = board(&[(10, &[1])]);
        {
            let mut tx = store.begin();
            tx.put_project(Project::new(ProjectId(2), "Other", Utc::now()));
            tx.put_group(TaskGroup::new(TaskGroupId(30), ProjectId(2), "g", 0)).unwrap();
            tx.commit();
        }
        let err = OrderingEngine::default()
            .move_tasks(&store, MoveRequest::new(TaskGroupId(10), TaskGroupId(30), ids(&[1])))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::CrossProject { .. }));
        assert_eq!(order(&store, 10), vec![1]);
    }
}
