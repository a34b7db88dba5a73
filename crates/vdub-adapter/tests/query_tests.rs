/*
[INPUT]:  In-memory task backend
[OUTPUT]: Test results for cached queries, invalidation, polling and paging
[POS]:    Integration tests - client-side task tracking
[UPDATE]: When query, cache or polling behavior changes
*/

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{FakeBackend, StallingBackend};
use tokio_util::sync::CancellationToken;
use vdub_adapter::query::{DETAIL_REFRESH_INTERVAL, LIST_REFRESH_INTERVAL};
use vdub_adapter::{
    ListTasksQuery,
    PageNavigator,
    PollState,
    QueryKey,
    TaskQueryLayer,
    TaskStatus,
    VdubError,
};

fn seeded_layer(count: usize) -> TaskQueryLayer<FakeBackend> {
    let backend = FakeBackend::new();
    for _ in 0..count {
        backend.create();
    }
    TaskQueryLayer::new(backend)
}

#[tokio::test]
async fn test_created_task_moves_from_pending_to_downloadable() {
    let layer = seeded_layer(0);
    let query = ListTasksQuery::new();
    assert_eq!(layer.list_tasks(&query).await.unwrap().total, 0);

    let task = layer
        .create_task(async { Ok(layer.api().create()) })
        .await
        .unwrap();

    let list = layer.list_tasks(&query).await.unwrap();
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].status, TaskStatus::Pending);
    assert_eq!(list.items[0].progress, 0);

    let err = layer.get_download_links(task.id).await.unwrap_err();
    assert!(matches!(err, VdubError::ResultNotReady { status: TaskStatus::Pending }));
    assert_eq!(layer.api().link_calls.load(Ordering::SeqCst), 0);

    layer.api().advance(task.id, TaskStatus::Completed, 100);
    let detail = layer.get_task(task.id).await.unwrap();
    assert_eq!(detail.task.progress, 100);
    assert!(detail.task.completed_at.is_some());

    let links = layer.get_download_links(task.id).await.unwrap();
    assert!(links.download_url.contains(&task.id.to_string()));
    layer.get_download_links(task.id).await.unwrap();
    assert_eq!(layer.api().link_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_twenty_three_tasks_paginate_into_three_pages() {
    let layer = seeded_layer(23);
    let first = layer
        .list_tasks(&ListTasksQuery::new().page_size(10))
        .await
        .unwrap();
    assert_eq!(first.total, 23);
    assert_eq!(first.total_pages, 3);

    let mut navigator = PageNavigator::new();
    navigator.set_total_pages(first.total_pages);
    assert!(navigator.is_visible());
    assert_eq!(navigator.visible_pages(), vec![1, 2, 3]);
    assert!(!navigator.request(4));
    assert!(navigator.request(3));

    let last = layer
        .list_tasks(&ListTasksQuery::new().page(navigator.page()).page_size(10))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 3);
}

#[tokio::test]
async fn test_malformed_status_filter_lists_everything() {
    let layer = seeded_layer(4);
    let pending = layer.api().create();
    layer.api().advance(pending.id, TaskStatus::Failed, 30);

    let all = layer
        .list_tasks(&ListTasksQuery::new().status_filter("not-a-stage"))
        .await
        .unwrap();
    assert_eq!(all.total, 5);

    let failed = layer
        .list_tasks(&ListTasksQuery::new().status_filter("failed"))
        .await
        .unwrap();
    assert_eq!(failed.total, 1);
}

#[tokio::test]
async fn test_delete_invalidates_lists_and_task_entries() {
    let layer = seeded_layer(2);
    let query = ListTasksQuery::new();
    let list = layer.list_tasks(&query).await.unwrap();
    layer.list_tasks(&query).await.unwrap();
    assert_eq!(layer.api().list_calls.load(Ordering::SeqCst), 1);

    let victim = list.items[0].id;
    layer.api().advance(victim, TaskStatus::Completed, 100);
    layer.get_download_links(victim).await.unwrap();
    assert!(layer.cache().contains(&QueryKey::TaskResult(victim)).await);

    layer.delete_task(victim).await.unwrap();
    assert!(!layer.cache().contains(&QueryKey::TaskResult(victim)).await);
    assert!(!layer.cache().contains(&QueryKey::TaskList(query.clone())).await);

    let after = layer.list_tasks(&query).await.unwrap();
    assert_eq!(after.total, 1);
    assert_eq!(layer.api().list_calls.load(Ordering::SeqCst), 2);

    let err = layer.delete_task(victim).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_failed_create_keeps_cached_lists() {
    let layer = seeded_layer(1);
    let query = ListTasksQuery::new();
    layer.list_tasks(&query).await.unwrap();

    let result = layer
        .create_task(async {
            Err(VdubError::TaskCreate {
                message: "unsupported language".into(),
            })
        })
        .await;
    assert!(result.is_err());
    assert!(layer.cache().contains(&QueryKey::TaskList(query)).await);
}

#[tokio::test]
async fn test_list_fetched_before_create_is_not_cached() {
    let layer = TaskQueryLayer::new(StallingBackend::new());
    let query = ListTasksQuery::new();
    layer.api().stall_next_list();

    let in_flight = tokio::spawn({
        let layer = layer.clone();
        let query = query.clone();
        async move { layer.list_tasks(&query).await }
    });
    layer.api().list_read.notified().await;

    layer
        .create_task(async { Ok(layer.api().backend.create()) })
        .await
        .unwrap();
    layer.api().release.notify_one();

    let stale = in_flight.await.unwrap().unwrap();
    assert_eq!(stale.total, 0);
    assert!(!layer.cache().contains(&QueryKey::TaskList(query.clone())).await);

    let list = layer.list_tasks(&query).await.unwrap();
    assert_eq!(layer.api().backend.len(), 1);
    assert_eq!(list.total, 1);
}

#[tokio::test(start_paused = true)]
async fn test_list_watch_picks_up_new_task() {
    let layer = seeded_layer(0);
    let root = CancellationToken::new();
    let watch = layer.watch_list(ListTasksQuery::new(), LIST_REFRESH_INTERVAL, &root);
    let mut updates = watch.updates();

    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().latest().map(|list| list.total), Some(0));

    layer
        .create_task(async { Ok(layer.api().create()) })
        .await
        .unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().latest().map(|list| list.total), Some(1));

    root.cancel();
    watch.into_handle().join().await;
}

#[tokio::test(start_paused = true)]
async fn test_detail_watch_stops_once_completed() {
    let layer = seeded_layer(0);
    let task = layer.api().create();
    let root = CancellationToken::new();
    let watch = layer.watch_task(task.id, DETAIL_REFRESH_INTERVAL, &root);
    let mut updates = watch.updates();

    updates.changed().await.unwrap();
    assert!(matches!(&*updates.borrow_and_update(), PollState::Ready(detail) if detail.task.status == TaskStatus::Pending));

    layer.api().advance(task.id, TaskStatus::Completed, 100);
    updates.changed().await.unwrap();
    assert!(matches!(&*updates.borrow_and_update(), PollState::Ready(detail) if detail.task.is_terminal()));

    watch.into_handle().join().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(layer.api().detail_calls.load(Ordering::SeqCst), 2);
}
