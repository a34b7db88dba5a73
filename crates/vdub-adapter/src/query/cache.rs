/*
[INPUT]:  Fetched task pages, task details, result links; mutation events
[OUTPUT]: Fresh-or-stale cached copies and per-key invalidation signals
[POS]:    Query layer - keyed read-through cache and subscriber registry
[UPDATE]: When adding cached resource kinds or changing invalidation scope
*/

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::types::{DownloadLinks, ListTasksQuery, TaskDetail, TaskListResponse};

/// Identity of one cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TaskList(ListTasksQuery),
    TaskDetail(Uuid),
    TaskResult(Uuid),
}

impl QueryKey {
    pub fn is_task_list(&self) -> bool {
        matches!(self, QueryKey::TaskList(_))
    }

    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            QueryKey::TaskDetail(id) | QueryKey::TaskResult(id) => Some(*id),
            QueryKey::TaskList(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    TaskList(TaskListResponse),
    TaskDetail(TaskDetail),
    TaskResult(DownloadLinks),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

/// How long each resource kind may be served without refetching.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
    /// Upper bound for result links; the link expiry shortens it further.
    pub result_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(60),
            detail_ttl: Duration::ZERO,
            result_ttl: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    subscribers: HashMap<QueryKey, watch::Sender<u64>>,
    /// Bumped by every list invalidation, including pages never cached.
    list_generation: u64,
    task_generations: HashMap<Uuid, u64>,
}

impl CacheState {
    fn generation(&self, key: &QueryKey) -> u64 {
        match key {
            QueryKey::TaskList(_) => self.list_generation,
            QueryKey::TaskDetail(id) | QueryKey::TaskResult(id) => {
                self.task_generations.get(id).copied().unwrap_or(0)
            }
        }
    }

    fn bump(&mut self, key: &QueryKey) {
        match key {
            QueryKey::TaskList(_) => self.list_generation += 1,
            QueryKey::TaskDetail(id) | QueryKey::TaskResult(id) => {
                *self.task_generations.entry(*id).or_default() += 1;
            }
        }
    }

    fn invalidate(&mut self, key: &QueryKey) -> bool {
        self.bump(key);
        let removed = self.entries.remove(key).is_some();
        if let Some(subscriber) = self.subscribers.get(key) {
            subscriber.send_modify(|generation| *generation += 1);
        }
        self.subscribers
            .retain(|_, subscriber| subscriber.receiver_count() > 0);
        removed
    }
}

/// Shared query cache.
///
/// Reads run concurrently; writes and invalidations are serialized by the
/// lock. Every key has its own generation counter that subscribers watch, so
/// a mutation wakes exactly the views depending on the keys it touched.
///
/// Fetches record [`QueryCache::generation`] before calling the backend and
/// hand it back on store; a fetch that raced an invalidation is not cached.
#[derive(Debug, Default)]
pub struct QueryCache {
    config: CacheConfig,
    state: RwLock<CacheState>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Watch invalidations of `key`. The value is a generation counter.
    pub async fn subscribe(&self, key: QueryKey) -> watch::Receiver<u64> {
        let mut state = self.state.write().await;
        state
            .subscribers
            .entry(key)
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }

    pub async fn fresh_list(&self, query: &ListTasksQuery) -> Option<TaskListResponse> {
        match self.fresh(&QueryKey::TaskList(query.clone())).await? {
            CachedValue::TaskList(list) => Some(list),
            _ => None,
        }
    }

    pub async fn fresh_detail(&self, id: Uuid) -> Option<TaskDetail> {
        match self.fresh(&QueryKey::TaskDetail(id)).await? {
            CachedValue::TaskDetail(detail) => Some(detail),
            _ => None,
        }
    }

    pub async fn fresh_result(&self, id: Uuid) -> Option<DownloadLinks> {
        match self.fresh(&QueryKey::TaskResult(id)).await? {
            CachedValue::TaskResult(links) => Some(links),
            _ => None,
        }
    }

    /// Invalidation generation of `key`, to be passed back to a `store_*` call.
    pub async fn generation(&self, key: &QueryKey) -> u64 {
        self.state.read().await.generation(key)
    }

    /// Returns false when the page was invalidated after `observed` was read.
    pub async fn store_list(
        &self,
        query: &ListTasksQuery,
        list: TaskListResponse,
        observed: u64,
    ) -> bool {
        let ttl = self.config.list_ttl;
        self.store(
            QueryKey::TaskList(query.clone()),
            CachedValue::TaskList(list),
            ttl,
            observed,
        )
        .await
    }

    pub async fn store_detail(&self, detail: TaskDetail, observed: u64) -> bool {
        let ttl = self.config.detail_ttl;
        self.store(
            QueryKey::TaskDetail(detail.task.id),
            CachedValue::TaskDetail(detail),
            ttl,
            observed,
        )
        .await
    }

    pub async fn store_result(&self, id: Uuid, links: DownloadLinks, observed: u64) -> bool {
        let ttl = self
            .config
            .result_ttl
            .min(Duration::from_secs(links.expires_in));
        self.store(
            QueryKey::TaskResult(id),
            CachedValue::TaskResult(links),
            ttl,
            observed,
        )
        .await
    }

    /// Drop one key and wake its subscribers. Returns whether an entry existed.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        self.state.write().await.invalidate(key)
    }

    /// Drop every task-list page (all pages, sizes and filters).
    pub async fn invalidate_task_lists(&self) -> usize {
        let mut state = self.state.write().await;
        state.list_generation += 1;
        let keys: Vec<QueryKey> = state
            .entries
            .keys()
            .chain(state.subscribers.keys())
            .filter(|key| key.is_task_list())
            .cloned()
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        keys.iter().filter(|key| state.invalidate(key)).count()
    }

    /// Drop the detail and result entries of one task.
    pub async fn invalidate_task(&self, id: Uuid) {
        let mut state = self.state.write().await;
        state.invalidate(&QueryKey::TaskDetail(id));
        state.invalidate(&QueryKey::TaskResult(id));
    }

    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.state.read().await.entries.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn fresh(&self, key: &QueryKey) -> Option<CachedValue> {
        let state = self.state.read().await;
        let entry = state.entries.get(key)?;
        entry.is_fresh(Instant::now()).then(|| entry.value.clone())
    }

    async fn store(&self, key: QueryKey, value: CachedValue, ttl: Duration, observed: u64) -> bool {
        let mut state = self.state.write().await;
        if state.generation(&key) != observed {
            debug!(?key, "fetch raced an invalidation; not cached");
            return false;
        }
        let now = Instant::now();
        state.entries.retain(|_, entry| entry.is_fresh(now));
        if ttl.is_zero() {
            return true;
        }
        state.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: now,
                ttl,
            },
        );
        true
    }
}
