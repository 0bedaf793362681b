// Downloader backend trait definition

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{DownloadProgress, DownloadReport, DownloadRequest, VideoInfo};
use super::process::RunLimits;

/// Trait for downloader backend implementations
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Check if this backend can run at all, within the command's limits.
    ///
    /// Errors only when the command times out or is cancelled.
    async fn is_available(&self, limits: &RunLimits) -> Result<bool, DownloadError>;

    /// Get video information and the list of streams
    async fn fetch_info(&self, url: &str, limits: &RunLimits) -> Result<VideoInfo, DownloadError>;

    /// Download with progress updates
    async fn download(
        &self,
        request: &DownloadRequest,
        limits: &RunLimits,
        progress: &dyn ProgressSink,
    ) -> Result<DownloadReport, DownloadError>;
}

/// Receives progress updates while a download runs
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: DownloadProgress);
}

/// Prints `Progress: <status>` lines to stdout
#[derive(Debug, Default)]
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn emit(&self, progress: DownloadProgress) {
        println!("Progress: {}", progress.status);
    }
}

/// Discards progress
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&self, _progress: DownloadProgress) {}
}

#[cfg(test)]
pub(crate) use recording::RecordingProgress;
