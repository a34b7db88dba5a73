/*
[INPUT]:  TaskQueryLayer, list query or task id, refresh interval, parent CancellationToken
[OUTPUT]: Background refresh loops publishing PollState snapshots via `watch`
[POS]:    Query layer - list and detail liveness (fixed and adaptive polling)
[UPDATE]: When refresh cadence, wake-up sources or stop conditions change
*/

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::http::Result;
use crate::query::cache::QueryKey;
use crate::query::layer::{TaskApi, TaskQueryLayer};
use crate::types::{ListTasksQuery, TaskDetail, TaskListResponse, TaskStatus};

/// List views refresh on this cadence regardless of task state.
pub const LIST_REFRESH_INTERVAL: Duration = Duration::from_secs(3);
/// Detail views refresh on this cadence while the task is not terminal.
pub const DETAIL_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

/// Latest outcome of a polling loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState<T> {
    Loading,
    Ready(T),
    /// The last fetch failed; `last` keeps the previous good value.
    Failed { message: String, last: Option<T> },
}

impl<T: Clone> PollState<T> {
    pub fn latest(&self) -> Option<&T> {
        match self {
            PollState::Loading => None,
            PollState::Ready(value) => Some(value),
            PollState::Failed { last, .. } => last.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PollState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    fn into_failed(self, message: String) -> Self {
        let last = match self {
            PollState::Loading => None,
            PollState::Ready(value) => Some(value),
            PollState::Failed { last, .. } => last,
        };
        PollState::Failed { message, last }
    }
}

fn publish<T: Clone>(tx: &watch::Sender<PollState<T>>, result: Result<T>) -> bool {
    match result {
        Ok(value) => {
            tx.send_replace(PollState::Ready(value));
            true
        }
        Err(err) => {
            let message = err.to_string();
            tx.send_modify(|state| {
                let previous = std::mem::replace(state, PollState::Loading);
                *state = previous.into_failed(message);
            });
            false
        }
    }
}

/// Schedule/cancel pair for one polling loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl PollHandle {
    fn new(cancel: CancellationToken, join: JoinHandle<()>) -> Self {
        Self {
            cancel,
            join: Some(join),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the loop to end on its own (detail loops end at a terminal status).
    pub async fn join(mut self) {
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                warn!(error = %err, "poll loop join error");
            }
        }
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.cancel();
        self.join().await;
    }

    /// Cancel and wait at most `limit`; a loop still running after that is
    /// aborted. Returns false when the loop had to be aborted.
    pub async fn stop_within(mut self, limit: Duration) -> bool {
        self.cancel();
        let Some(mut join) = self.join.take() else {
            return true;
        };
        match tokio::time::timeout(limit, &mut join).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(error = %err, "poll loop join error");
                true
            }
            Err(_) => {
                join.abort();
                false
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A running task-list refresh loop.
#[derive(Debug)]
pub struct ListWatch {
    updates: watch::Receiver<PollState<TaskListResponse>>,
    focus: Arc<Notify>,
    handle: PollHandle,
}

impl ListWatch {
    pub fn updates(&self) -> watch::Receiver<PollState<TaskListResponse>> {
        self.updates.clone()
    }

    pub fn current(&self) -> PollState<TaskListResponse> {
        self.updates.borrow().clone()
    }

    /// Refresh immediately, as when the view regains focus.
    pub fn focus_regained(&self) {
        self.focus.notify_one();
    }

    pub fn handle(&self) -> &PollHandle {
        &self.handle
    }

    pub fn into_handle(self) -> PollHandle {
        self.handle
    }
}

/// A running task-detail refresh loop.
#[derive(Debug)]
pub struct DetailWatch {
    task_id: Uuid,
    updates: watch::Receiver<PollState<TaskDetail>>,
    handle: PollHandle,
}

impl DetailWatch {
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn updates(&self) -> watch::Receiver<PollState<TaskDetail>> {
        self.updates.clone()
    }

    pub fn current(&self) -> PollState<TaskDetail> {
        self.updates.borrow().clone()
    }

    pub fn handle(&self) -> &PollHandle {
        &self.handle
    }

    pub fn into_handle(self) -> PollHandle {
        self.handle
    }
}

impl<A: TaskApi + 'static> TaskQueryLayer<A> {
    /// Refresh `query` every `interval`, on [`ListWatch::focus_regained`] and
    /// whenever its cache key is invalidated, until cancelled.
    ///
    /// A failed fetch is published as [`PollState::Failed`] and the schedule
    /// continues.
    pub fn watch_list(
        &self,
        query: ListTasksQuery,
        interval: Duration,
        parent: &CancellationToken,
    ) -> ListWatch {
        let (tx, rx) = watch::channel(PollState::Loading);
        let focus = Arc::new(Notify::new());
        let cancel = parent.child_token();

        let layer = self.clone();
        let loop_focus = focus.clone();
        let loop_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            run_list_loop(layer, query, interval, loop_focus, loop_cancel, tx).await;
        });

        ListWatch {
            updates: rx,
            focus,
            handle: PollHandle::new(cancel, join),
        }
    }

    /// Refresh task `id` every `interval` while its last observed status is
    /// non-terminal. The decision is re-made after every fetch, so the loop
    /// exits right after the first terminal status it sees.
    pub fn watch_task(&self, id: Uuid, interval: Duration, parent: &CancellationToken) -> DetailWatch {
        let (tx, rx) = watch::channel(PollState::Loading);
        let cancel = parent.child_token();

        let layer = self.clone();
        let loop_cancel = cancel.clone();
        let join = tokio::spawn(async move {
            run_detail_loop(layer, id, interval, loop_cancel, tx).await;
        });

        DetailWatch {
            task_id: id,
            updates: rx,
            handle: PollHandle::new(cancel, join),
        }
    }
}

async fn run_list_loop<A: TaskApi>(
    layer: TaskQueryLayer<A>,
    query: ListTasksQuery,
    interval: Duration,
    focus: Arc<Notify>,
    cancel: CancellationToken,
    tx: watch::Sender<PollState<TaskListResponse>>,
) {
    let key = QueryKey::TaskList(query.clone());
    let mut invalidated = layer.cache().subscribe(key.clone()).await;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(page = query.current_page(), "task list polling started");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            _ = focus.notified() => {
                debug!(page = query.current_page(), "focus regained; refreshing task list");
            }
            changed = invalidated.changed() => {
                if changed.is_err() {
                    invalidated = layer.cache().subscribe(key.clone()).await;
                }
            }
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = layer.refresh_list(&query) => result,
        };
        if let Err(err) = &result {
            warn!(page = query.current_page(), error = %err, "task list refresh failed");
        }
        publish(&tx, result);
    }
    debug!(page = query.current_page(), "task list polling stopped");
}

async fn run_detail_loop<A: TaskApi>(
    layer: TaskQueryLayer<A>,
    id: Uuid,
    interval: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<PollState<TaskDetail>>,
) {
    let key = QueryKey::TaskDetail(id);
    let mut invalidated = layer.cache().subscribe(key.clone()).await;
    let mut last_status: Option<TaskStatus> = None;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = layer.refresh_task(id) => result,
        };

        match &result {
            Ok(detail) => {
                let status = detail.task.status.clone();
                if let Some(previous) = &last_status {
                    if !previous.can_advance_to(&status) {
                        warn!(task_id = %id, from = %previous, to = %status, "unexpected task status transition");
                    }
                }
                if last_status.as_ref() != Some(&status) {
                    info!(task_id = %id, status = %status, progress = detail.task.progress, "task status observed");
                }
                last_status = Some(status);
            }
            Err(err) => {
                warn!(task_id = %id, error = %err, "task refresh failed; will retry");
            }
        }
        publish(&tx, result);

        if last_status.as_ref().is_some_and(TaskStatus::is_terminal) {
            info!(task_id = %id, "task reached a terminal status; detail polling stopped");
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
            changed = invalidated.changed() => {
                if changed.is_err() {
                    invalidated = layer.cache().subscribe(key.clone()).await;
                }
            }
        }
    }
}
