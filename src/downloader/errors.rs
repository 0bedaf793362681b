// Error types for downloader backends

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Not an absolute http(s) URL, or rejected by yt-dlp
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// yt-dlp, python or ffmpeg not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Network timeout while connecting to YouTube
    #[error("Network timeout: YouTube is not responding")]
    NetworkTimeout,

    /// YouTube blocked the request (429, bot detection, etc.)
    #[error(
        "YouTube is throttling or blocking requests from this address: {0}\n\
         Try again later, or pass --proxy / --cookies"
    )]
    BlockedByYouTube(String),

    /// Private, deleted, DRM-protected or otherwise unavailable video
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// The video offers nothing that carries audio
    #[error("No audio streams found")]
    NoAudioStream,

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// The caller's deadline expired; the subprocess was killed
    #[error("Operation timed out after {seconds} seconds")]
    TimedOut { seconds: u64 },

    /// Interrupted by the user or by a cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// The tool reported success but no output file could be located
    #[error("No output audio file found (expected {})", .0.display())]
    OutputMissing(PathBuf),

    /// The output file exists but is empty
    #[error("Downloaded file is empty: {}", .0.display())]
    EmptyOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown error with details
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DownloadError {
    /// Classify the stderr of a failed yt-dlp run.
    pub fn from_stderr(stderr: &str) -> Self {
        let detail = summarize_stderr(stderr);
        let lower = stderr.to_lowercase();

        // IP blocking shows up as a timeout against youtube.com
        if (lower.contains("timeout") || lower.contains("timed out")) && lower.contains("youtube.com")
        {
            return Self::BlockedByYouTube(detail);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("sign in to confirm you're not a bot")
            || lower.contains("http error 403")
        {
            return Self::BlockedByYouTube(detail);
        }

        if lower.contains("video unavailable")
            || lower.contains("private video")
            || lower.contains("video is private")
            || lower.contains("has been removed")
            || lower.contains("no longer available")
            || lower.contains("drm")
            || lower.contains("members-only")
            || lower.contains("age-restricted")
        {
            return Self::Unavailable(detail);
        }

        if lower.contains("unsupported url")
            || lower.contains("is not a valid url")
            || lower.contains("incomplete youtube id")
        {
            return Self::InvalidUrl(detail);
        }

        if lower.contains("requested format is not available") {
            return Self::NoAudioStream;
        }

        if lower.contains("ffmpeg not found") || lower.contains("ffprobe and ffmpeg not found") {
            return Self::ToolNotFound("ffmpeg".to_string());
        }

        if lower.contains("no module named yt_dlp") || lower.contains("command not found") {
            return Self::ToolNotFound(detail);
        }

        Self::Unknown(detail)
    }

    /// Deadline expiry or user interruption; partial files should be removed.
    pub fn is_interrupt(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::Cancelled)
    }

    /// Errors after which trying another backend is pointless.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::TimedOut { .. } | Self::Cancelled | Self::InvalidUrl(_) | Self::Unavailable(_)
        )
    }
}

/// Keep the `ERROR:` lines of yt-dlp output, or the last line if there are none.
fn summarize_stderr(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("; ");
    }

    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("no diagnostic output")
        .to_string()
}
