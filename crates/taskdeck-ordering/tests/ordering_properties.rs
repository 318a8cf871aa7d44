use chrono::Utc;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use taskdeck_model::{Project, ProjectId, Task, TaskGroup, TaskGroupId, TaskId, UserId};
use taskdeck_ordering::{MoveRequest, OrderError, OrderViolation, OrderingEngine, ReorderRequest};
use taskdeck_store::MemoryStore;

fn board(groups: &[(u64, Vec<u64>)]) -> MemoryStore {
    let store = MemoryStore::new();
    let mut tx = store.begin();
    tx.put_project(Project::new(ProjectId(1), "Apollo", Utc::now()));
    for (position, (group, tasks)) in groups.iter().enumerate() {
        tx.put_group(TaskGroup::new(TaskGroupId(*group), ProjectId(1), "g", position as u32))
            .unwrap();
        for (rank, id) in tasks.iter().enumerate() {
            let mut task = Task::new(TaskId(*id), ProjectId(1), Some(TaskGroupId(*group)), "t", UserId(1), Utc::now());
            task.rank = rank as u32;
            tx.put_task(task).unwrap();
        }
    }
    tx.commit();
    store
}

fn order(store: &MemoryStore, group: u64) -> Vec<TaskId> {
    store.read().group_order(TaskGroupId(group))
}

fn ids(raw: &[u64]) -> Vec<TaskId> {
    raw.iter().map(|r| TaskId(*r)).collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_reorder_reads_back_permutation(
        perm in Just((100u64..110).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let store = board(&[(10, (100..110).collect())]);
        let engine = OrderingEngine::default();
        let wanted = ids(&perm);

        runtime()
            .block_on(engine.reorder(&store, ReorderRequest::new(TaskGroupId(10), wanted.clone())))
            .unwrap();

        prop_assert_eq!(order(&store, 10), wanted.clone());

        // same request again is a no-op on the order
        runtime()
            .block_on(engine.reorder(&store, ReorderRequest::new(TaskGroupId(10), wanted.clone())))
            .unwrap();
        prop_assert_eq!(order(&store, 10), wanted);
    }
}

#[tokio::test]
async fn foreign_id_leaves_ranks_unchanged() {
    let store = board(&[(10, vec![1, 2, 3]), (20, vec![4])]);
    let before = store.snapshot();

    let err = OrderingEngine::default()
        .reorder(&store, ReorderRequest::new(TaskGroupId(10), ids(&[3, 4, 1, 2])))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::InvalidOrderSet {
            violation: OrderViolation::Foreign(TaskId(4)),
            ..
        }
    ));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn invalid_move_leaves_both_groups_unchanged() {
    let store = board(&[(10, vec![1, 2]), (20, vec![4, 5])]);
    let before = store.snapshot();

    // destination task 5 left out
    let err = OrderingEngine::default()
        .move_tasks(&store, MoveRequest::new(TaskGroupId(10), TaskGroupId(20), ids(&[1, 4])))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::InvalidOrderSet {
            violation: OrderViolation::Missing(TaskId(5)),
            ..
        }
    ));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reorders_serialize() {
    for _ in 0..20 {
        let store = Arc::new(board(&[(10, vec![1, 2, 3, 4])]));
        let engine = Arc::new(OrderingEngine::new(Duration::from_secs(2)));
        let a = ids(&[4, 3, 2, 1]);
        let b = ids(&[2, 4, 1, 3]);

        let first = {
            let (store, engine, a) = (store.clone(), engine.clone(), a.clone());
            tokio::spawn(async move { engine.reorder(&store, ReorderRequest::new(TaskGroupId(10), a)).await })
        };
        let second = {
            let (store, engine, b) = (store.clone(), engine.clone(), b.clone());
            tokio::spawn(async move { engine.reorder(&store, ReorderRequest::new(TaskGroupId(10), b)).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let final_order = order(&store, 10);
        assert!(final_order == a || final_order == b, "interleaved order {final_order:?}");
        let ranks: Vec<u32> = final_order
            .iter()
            .map(|id| store.read().task(*id).unwrap().rank)
            .collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert_eq!(store.read().group(TaskGroupId(10)).unwrap().version, 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reorder_and_move_serialize() {
    for _ in 0..20 {
        let store = Arc::new(board(&[(10, vec![1, 2, 3]), (20, vec![4])]));
        let engine = Arc::new(OrderingEngine::new(Duration::from_secs(2)));

        let reorder = {
            let (store, engine) = (store.clone(), engine.clone());
            tokio::spawn(async move {
                engine
                    .reorder(&store, ReorderRequest::new(TaskGroupId(10), ids(&[3, 2, 1])))
                    .await
            })
        };
        let moved = {
            let (store, engine) = (store.clone(), engine.clone());
            tokio::spawn(async move {
                engine
                    .move_tasks(&store, MoveRequest::new(TaskGroupId(10), TaskGroupId(20), ids(&[2, 4])))
                    .await
            })
        };
        let reorder = reorder.await.unwrap();
        moved.await.unwrap().unwrap();

        assert_eq!(order(&store, 20), ids(&[2, 4]));
        match reorder {
            // reorder ran first, then the move took task 2 out
            Ok(_) => assert_eq!(order(&store, 10), ids(&[3, 1])),
            // move ran first; the stale full list no longer matches the group
            Err(err) => {
                assert!(matches!(err, OrderError::InvalidOrderSet { .. }));
                assert_eq!(order(&store, 10), ids(&[1, 3]));
            }
        }
    }
}
