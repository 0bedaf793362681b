// Extractor configuration

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

/// Which yt-dlp flavour to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendMode {
    /// Python module yt_dlp (`python3 -m yt_dlp`)
    Python,
    /// Native yt-dlp binary
    Cli,
    /// Python first, native binary as fallback
    #[default]
    Auto,
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Configuration shared by backends, the transcoder and the commands
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Backend selection (Python, CLI, or Auto)
    pub mode: BackendMode,
    /// Explicit yt-dlp binary; searched for when unset
    pub ytdlp_path: Option<PathBuf>,
    /// Python interpreter used for `-m yt_dlp`
    pub python_cmd: Option<String>,
    /// Explicit ffmpeg binary; also handed to yt-dlp as `--ffmpeg-location`
    pub ffmpeg_path: Option<PathBuf>,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<PathBuf>,
    /// Browser to read cookies from (chrome, firefox, ...)
    pub cookies_from_browser: Option<String>,
    /// yt-dlp `--socket-timeout`, in seconds
    pub socket_timeout: u32,
    /// yt-dlp `--retries`; yt-dlp's own default when unset
    pub retries: Option<u32>,
    /// YouTube player client (android, web, tv)
    pub player_client: Option<String>,
    /// Target codec of the audio postprocessor
    pub audio_format: String,
    /// Target bitrate in kbps
    pub audio_quality: String,
    /// Deadline for the whole command
    pub timeout: Option<Duration>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Auto,
            ytdlp_path: None,
            python_cmd: None,
            ffmpeg_path: None,
            proxy: None,
            cookies_path: None,
            cookies_from_browser: None,
            socket_timeout: 30,
            retries: None,
            player_client: None,
            audio_format: "mp3".to_string(),
            audio_quality: "192".to_string(),
            timeout: None,
        }
    }
}

impl ExtractorConfig {
    pub fn with_mode(mut self, mode: BackendMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_ytdlp_path(mut self, path: Option<PathBuf>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_python_cmd(mut self, cmd: Option<String>) -> Self {
        self.python_cmd = cmd;
        self
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = path;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_cookies_from_browser(mut self, browser: Option<String>) -> Self {
        self.cookies_from_browser = browser;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout = seconds;
        self
    }

    pub fn with_retries(mut self, retries: Option<u32>) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_player_client(mut self, client: Option<String>) -> Self {
        self.player_client = client;
        self
    }

    pub fn with_audio(mut self, format: impl Into<String>, quality: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self.audio_quality = quality.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
