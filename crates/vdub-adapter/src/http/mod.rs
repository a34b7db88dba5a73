/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: Typed backend results and storage upload outcomes
[POS]:    HTTP layer - backend REST and object storage communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod monitoring;
pub mod tasks;
pub mod upload;

pub use error::{Result, VdubError};

pub use client::{ClientConfig, DEFAULT_BASE_URL, VdubClient};
