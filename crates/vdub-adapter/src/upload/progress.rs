/*
[INPUT]:  File byte stream and total size
[OUTPUT]: Integer percent callbacks (0-100) as bytes are handed to the transport
[POS]:    Upload layer - transfer progress reporting
[UPDATE]: When progress granularity or callback shape changes
*/

use std::sync::Arc;

use futures_util::{Stream, TryStreamExt};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Receives upload progress as an integer percent.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Converts transferred byte counts into de-duplicated percent callbacks.
pub struct ProgressTracker {
    total: u64,
    sent: u64,
    last_percent: Option<u8>,
    callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("sent", &self.sent)
            .field("last_percent", &self.last_percent)
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(total: u64, callback: Option<ProgressCallback>) -> Self {
        Self {
            total,
            sent: 0,
            last_percent: None,
            callback,
        }
    }

    /// Record `bytes` more transferred. Returns the percent when it changed.
    ///
    /// An empty file has no meaningful percentage and reports nothing.
    pub fn advance(&mut self, bytes: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        self.sent = self.sent.saturating_add(bytes).min(self.total);
        let percent = percent_of(self.sent, self.total);
        if self.last_percent == Some(percent) {
            return None;
        }
        self.last_percent = Some(percent);
        tracing::debug!(percent, sent = self.sent, total = self.total, "upload progress");
        if let Some(callback) = &self.callback {
            callback(percent);
        }
        Some(percent)
    }
}

/// Rounded percentage of `sent` over `total`, capped at 100.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let scaled = (u128::from(sent) * 100 + u128::from(total) / 2) / u128::from(total);
    scaled.min(100) as u8
}

/// Stream a file while feeding its chunk sizes to `tracker`.
pub fn tracked_file_stream(
    file: File,
    mut tracker: ProgressTracker,
) -> impl Stream<Item = std::io::Result<bytes::Bytes>> + Send + 'static {
    ReaderStream::new(file).inspect_ok(move |chunk| {
        tracker.advance(chunk.len() as u64);
    })
}
