/*
[INPUT]:  Session, list query, task ids, shutdown CancellationToken
[OUTPUT]: Concurrent list/detail polling loops printing updates until shutdown
[POS]:    Execution layer - supervision of polling loops for `watch`
[UPDATE]: When changing watch output or shutdown guarantees
*/

use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;
use vdub_adapter::{ListTasksQuery, PollHandle, PollState, TaskDetail};

use crate::render;
use crate::session::Session;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct ManagedWatch {
    label: String,
    poll: PollHandle,
    printer: JoinHandle<()>,
}

/// Supervises the polling loops of one `watch` invocation.
///
/// Every loop runs under a child of one shutdown token; `shutdown_and_wait`
/// cancels them all and joins each against a shared deadline.
#[derive(Debug)]
pub struct WatchManager {
    session: Session,
    watches: Vec<ManagedWatch>,
    shutdown: CancellationToken,
}

impl WatchManager {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            watches: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Poll one list page and reprint it on every refresh.
    pub fn watch_list(&mut self, query: ListTasksQuery) {
        let interval = self.session.config().list_refresh();
        let label = format!("list page {}", query.current_page());
        let page = query.current_page();
        let list = self
            .session
            .queries()
            .watch_list(query, interval, &self.shutdown);
        let printer = spawn_printer(list.updates(), self.shutdown.clone(), move |list| {
            match render::navigator_at(list, page) {
                Some(navigator) => render::task_table(list, &navigator),
                None => format!("{}\n", render::page_out_of_range(page, list.total_pages)),
            }
        });
        info!(label = %label, interval_secs = interval.as_secs(), "watch started");
        self.watches.push(ManagedWatch {
            label,
            poll: list.into_handle(),
            printer,
        });
    }

    /// Poll one task until it reaches a terminal status.
    pub fn watch_task(&mut self, id: Uuid) {
        let interval = self.session.config().detail_refresh();
        let detail = self.session.queries().watch_task(id, interval, &self.shutdown);
        let printer = spawn_printer(detail.updates(), self.shutdown.clone(), detail_line);
        info!(task_id = %id, interval_secs = interval.as_secs(), "watch started");
        self.watches.push(ManagedWatch {
            label: format!("task {id}"),
            poll: detail.into_handle(),
            printer,
        });
    }

    /// True once every loop has exited. List loops only exit on shutdown.
    pub fn all_finished(&self) -> bool {
        self.watches.iter().all(|watch| watch.poll.is_finished())
    }

    /// Wait until shutdown is requested or every loop has finished.
    pub async fn run_until_done(&self) {
        loop {
            if self.all_finished() {
                info!("all watched tasks reached a terminal status");
                return;
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_millis(200)) => {}
            }
        }
    }

    pub async fn shutdown_and_wait(&mut self) -> Result<()> {
        self.shutdown.cancel();
        self.join_all_with_deadline(SHUTDOWN_TIMEOUT).await
    }

    async fn join_all_with_deadline(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut timed_out = Vec::new();

        for watch in std::mem::take(&mut self.watches) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !watch.poll.stop_within(remaining).await {
                timed_out.push(watch.label.clone());
            }
            let mut printer = watch.printer;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if tokio::time::timeout(remaining, &mut printer).await.is_err() {
                printer.abort();
            }
        }

        if timed_out.is_empty() {
            Ok(())
        } else {
            warn!(watches = ?timed_out, "watches aborted after shutdown deadline");
            Err(anyhow!("shutdown timed out after {timeout:?}: {}", timed_out.join(", ")))
        }
    }
}

fn detail_line(detail: &TaskDetail) -> String {
    format!(
        "{}  {}  {}%{}\n",
        detail.task.id,
        render::status_badge(&detail.task.status),
        detail.task.progress,
        detail
            .task
            .current_step
            .as_deref()
            .map(|step| format!("  {step}"))
            .unwrap_or_default()
    )
}

/// Print every snapshot published on `updates` until the loop ends or shutdown.
fn spawn_printer<T, F>(
    mut updates: watch::Receiver<PollState<T>>,
    shutdown: CancellationToken,
    render_ready: F,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            let text = match &*updates.borrow_and_update() {
                PollState::Loading => continue,
                PollState::Ready(value) => render_ready(value),
                PollState::Failed { message, .. } => format!("refresh failed: {message}\n"),
            };
            print!("{} {text}", chrono::Local::now().format("%H:%M:%S"));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn task_body(id: Uuid, status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": "demo",
            "source_language": "en",
            "target_language": "zh",
            "status": status,
            "subtitle_mode": "EXTERNAL",
            "progress": 100,
            "segment_count": 0,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z"
        })
    }

    async fn session_for(server: &MockServer) -> Session {
        let mut config = TrackerConfig::default();
        config.apply_base_url_override(Some(format!("{}/api/v1", server.uri()).as_str()), None);
        config.detail.refresh_secs = 1;
        Session::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_watch_ends_when_task_is_terminal() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/tasks/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_body(id, "completed")))
            .expect(1)
            .mount(&server)
            .await;

        let mut manager = WatchManager::new(session_for(&server).await);
        manager.watch_task(id);
        tokio::time::timeout(Duration::from_secs(5), manager.run_until_done())
            .await
            .expect("watch should finish on its own");
        assert!(manager.all_finished());
        manager.shutdown_and_wait().await.unwrap();
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_list_watch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [], "total": 0, "page": 1, "page_size": 10, "total_pages": 0
            })))
            .mount(&server)
            .await;

        let mut manager = WatchManager::new(session_for(&server).await);
        manager.watch_list(ListTasksQuery::new().page_size(10));
        assert_eq!(manager.len(), 1);
        assert!(!manager.all_finished());

        manager.shutdown_token().cancel();
        manager.run_until_done().await;
        manager.shutdown_and_wait().await.unwrap();
    }
}
