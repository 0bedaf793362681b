// CLI backend - uses the native `yt-dlp` binary
//
// Faster to start than Python mode and has no interpreter dependency.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::invocation::{download_with, fetch_info_with};
use crate::config::ExtractorConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadReport, DownloadRequest, VideoInfo};
use crate::downloader::process::{RunLimits, ToolCommand};
use crate::downloader::tools::query_version;
use crate::downloader::traits::{MediaBackend, ProgressSink};

/// Native yt-dlp binary
pub struct CliBackend {
    tool: ToolCommand,
    config: ExtractorConfig,
    version: OnceCell<Option<String>>,
}

impl CliBackend {
    pub fn new(tool: ToolCommand, config: ExtractorConfig) -> Self {
        Self {
            tool,
            config,
            version: OnceCell::new(),
        }
    }
}

#[async_trait]
impl MediaBackend for CliBackend {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    async fn is_available(&self, limits: &RunLimits) -> Result<bool, DownloadError> {
        let version = self
            .version
            .get_or_try_init(|| query_version(&self.tool, "--version", limits))
            .await?;
        Ok(version.is_some())
    }

    async fn fetch_info(&self, url: &str, limits: &RunLimits) -> Result<VideoInfo, DownloadError> {
        fetch_info_with(&self.tool, &self.config, url, limits).await
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        limits: &RunLimits,
        progress: &dyn ProgressSink,
    ) -> Result<DownloadReport, DownloadError> {
        download_with(&self.tool, &self.config, request, limits, progress).await
    }
}
