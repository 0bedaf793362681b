// Orchestrator with fallback logic

use tracing::{info, warn};

use crate::config::{BackendMode, ExtractorConfig};

use super::backends::{CliBackend, PythonBackend};
use super::errors::DownloadError;
use super::models::{DownloadReport, DownloadRequest, VideoInfo};
use super::process::RunLimits;
use super::tools::ToolSet;
use super::traits::{MediaBackend, ProgressSink};

pub struct Downloader {
    backends: Vec<Box<dyn MediaBackend>>,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Backends in the order the configured mode asks for
    pub fn from_config(config: &ExtractorConfig, tools: &ToolSet) -> Self {
        let mut downloader = Self::new();
        let python = || Box::new(PythonBackend::new(tools.python_ytdlp.clone(), config.clone()));
        let cli = || Box::new(CliBackend::new(tools.ytdlp.clone(), config.clone()));

        match config.mode {
            BackendMode::Python => downloader.add_backend(python()),
            BackendMode::Cli => downloader.add_backend(cli()),
            BackendMode::Auto => {
                downloader.add_backend(python());
                downloader.add_backend(cli());
            }
        }
        downloader
    }

    pub fn add_backend(&mut self, backend: Box<dyn MediaBackend>) {
        self.backends.push(backend);
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn fetch_info(&self, url: &str, limits: &RunLimits) -> Result<VideoInfo, DownloadError> {
        let mut last_error = None;

        for backend in &self.backends {
            if !backend.is_available(limits).await? {
                info!(backend = backend.name(), "backend not available, skipping");
                last_error = Some(DownloadError::ToolNotFound(backend.name().to_string()));
                continue;
            }

            info!(backend = backend.name(), "fetching video info");
            match backend.fetch_info(url, limits).await {
                Ok(info) => {
                    info!(backend = backend.name(), id = ?info.id, "video info fetched");
                    return Ok(info);
                }
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "info fetch failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DownloadError::Unknown("No backends configured".to_string())))
    }

    pub async fn download(
        &self,
        request: &DownloadRequest,
        limits: &RunLimits,
        progress: &dyn ProgressSink,
    ) -> Result<DownloadReport, DownloadError> {
        let mut last_error = None;

        for backend in &self.backends {
            if !backend.is_available(limits).await? {
                info!(backend = backend.name(), "backend not available, skipping");
                last_error = Some(DownloadError::ToolNotFound(backend.name().to_string()));
                continue;
            }

            info!(backend = backend.name(), url = %request.url, "downloading");
            match backend.download(request, limits, progress).await {
                Ok(report) => {
                    info!(backend = backend.name(), "download finished");
                    return Ok(report);
                }
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "download failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DownloadError::Unknown("No backends configured".to_string())))
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}
