/*
[INPUT]:  Public API exports for vdub-tracker crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod cli;
pub mod config;
pub mod render;
pub mod session;
pub mod watch;

// Re-export main types for convenience
pub use config::TrackerConfig;
pub use session::{Session, SubmitOptions};
pub use watch::WatchManager;
