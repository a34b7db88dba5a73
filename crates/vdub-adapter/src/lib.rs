/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public video dubbing client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod pagination;
pub mod presentation;
pub mod query;
pub mod types;
pub mod upload;

// Re-export commonly used types from http
pub use http::{ClientConfig, DEFAULT_BASE_URL, Result, VdubClient, VdubError};

pub use pagination::{PAGE_WINDOW, PageNavigator, windowed_pages};

pub use query::{
    CacheConfig,
    DetailWatch,
    ListWatch,
    PollHandle,
    PollState,
    QueryCache,
    QueryKey,
    TaskApi,
    TaskQueryLayer,
};

pub use upload::{ProgressCallback, UploadOrchestrator, UploadSource};

// Re-export all types
pub use types::*;
