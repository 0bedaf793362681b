// Python backend - uses `python3 -m yt_dlp`
//
// Tends to get past YouTube bot detection more often and picks up the
// interpreter's yt_dlp version, which pip keeps fresher than distro packages.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::invocation::{download_with, fetch_info_with};
use crate::config::ExtractorConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadReport, DownloadRequest, VideoInfo};
use crate::downloader::process::{RunLimits, ToolCommand};
use crate::downloader::tools::query_version;
use crate::downloader::traits::{MediaBackend, ProgressSink};

/// yt_dlp module run through a Python interpreter
pub struct PythonBackend {
    tool: ToolCommand,
    config: ExtractorConfig,
    version: OnceCell<Option<String>>,
}

impl PythonBackend {
    /// `tool` is expected to already carry `-m yt_dlp`
    pub fn new(tool: ToolCommand, config: ExtractorConfig) -> Self {
        Self {
            tool,
            config,
            version: OnceCell::new(),
        }
    }
}

#[async_trait]
impl MediaBackend for PythonBackend {
    fn name(&self) -> &'static str {
        "python-yt-dlp"
    }

    async fn is_available(&self, limits: &RunLimits) -> Result<bool, DownloadError> {
        // `python3 -m yt_dlp --version` fails when the module is missing
        let version = self
            .version
            .get_or_try_init(|| query_version(&self.tool, "--version", limits))
            .await?;
        Ok(version.is_some())
    }

    async fn fetch_info(&self, url: &str, limits: &RunLimits) -> Result<VideoInfo, DownloadError> {
        fetch_info_with(&self.tool, &self.config, url, limits)
            .await
            .map_err(|e| match e {
                DownloadError::ExecutionError(msg) => {
                    DownloadError::ExecutionError(format!("Python yt-dlp error: {}", msg))
                }
                other => other,
            })
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
