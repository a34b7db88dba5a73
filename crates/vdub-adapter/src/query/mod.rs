/*
[INPUT]:  TaskApi implementation (normally VdubClient)
[OUTPUT]: Cached task queries, mutation invalidation, polling loops
[POS]:    Query layer - client-side view of backend-owned tasks
[UPDATE]: When adding query kinds or refresh policies
*/

pub mod cache;
pub mod layer;
pub mod poller;

pub use cache::{CacheConfig, QueryCache, QueryKey};
pub use layer::{TaskApi, TaskQueryLayer};
pub use poller::{
    DETAIL_REFRESH_INTERVAL, DetailWatch, LIST_REFRESH_INTERVAL, ListWatch, PollHandle, PollState,
};
