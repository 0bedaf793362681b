//! Command-line definition.
//!
//! Tool locations and network options are global so they can appear before
//! or after the subcommand. Most of them also read an environment variable.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{BackendMode, ExtractorConfig};

/// Default deadline of `extract`, in seconds
pub const DEFAULT_EXTRACT_TIMEOUT: u64 = 120;

/// Fetch the audio track of an online video with yt-dlp
#[derive(Parser, Debug)]
#[command(name = "ytaudio")]
#[command(version, about = "Download and extract audio from online videos")]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Path to the yt-dlp binary
    #[arg(long = "ytdlp-path", env = "YTAUDIO_YTDLP", global = true)]
    pub ytdlp_path: Option<PathBuf>,

    /// Python interpreter that has the yt_dlp module
    #[arg(long = "python", env = "YTDLP_PYTHON", global = true)]
    pub python: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long = "ffmpeg-path", env = "YTAUDIO_FFMPEG", global = true)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Proxy URL (e.g. socks5://127.0.0.1:1080)
    #[arg(long, env = "YTAUDIO_PROXY", global = true)]
    pub proxy: Option<String>,

    /// Netscape-format cookies file
    #[arg(long, env = "YTAUDIO_COOKIES", global = true)]
    pub cookies: Option<PathBuf>,

    /// Read cookies from a browser profile (chrome, firefox, ...)
    #[arg(long = "cookies-from-browser", global = true)]
    pub cookies_from_browser: Option<String>,

    /// YouTube player client (android, web, tv)
    #[arg(long = "player-client", global = true)]
    pub player_client: Option<String>,

    /// Network socket timeout in seconds
    #[arg(long = "socket-timeout", default_value_t = 30, global = true)]
    pub socket_timeout: u32,

    /// Number of retries yt-dlp makes per request
    #[arg(long, global = true)]
    pub retries: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the best audio and convert it with yt-dlp's postprocessor
    Extract {
        /// Video page URL
        video_url: String,
        /// Output file; the extension is replaced by the audio format
        output_path: PathBuf,
        /// Deadline for the whole command
        #[arg(default_value_t = DEFAULT_EXTRACT_TIMEOUT)]
        timeout_seconds: u64,
        /// Which yt-dlp flavour to run
        #[arg(long, value_enum, default_value_t = BackendMode::Auto)]
        backend: BackendMode,
        /// Target audio codec
        #[arg(long = "audio-format", default_value = "mp3")]
        audio_format: String,
        /// Target bitrate in kbps
        #[arg(long = "audio-quality", default_value = "192")]
        audio_quality: String,
    },

    /// Pick the best audio stream and save it to exactly the given path
    Stream {
        /// Video page URL
        video_url: String,
        /// Output file, written as given
        output_path: PathBuf,
        /// Deadline for the whole command; unbounded when omitted
        timeout_seconds: Option<u64>,
        /// Convert the downloaded stream to MP3 with ffmpeg
        #[arg(long)]
        transcode: bool,
        /// Which yt-dlp flavour to run
        #[arg(long, value_enum, default_value_t = BackendMode::Auto)]
        backend: BackendMode,
    },

    /// Print video metadata as one JSON object
    Info {
        /// Video page URL
        video_url: String,
        /// Deadline for the command; unbounded when omitted
        timeout_seconds: Option<u64>,
        /// Which yt-dlp flavour to run
        #[arg(long, value_enum, default_value_t = BackendMode::Auto)]
        backend: BackendMode,
    },

    /// Show which external tools are available
    Tools {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Deadline requested on the command line
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            Commands::Extract {
                timeout_seconds, ..
            } => Some(Duration::from_secs(*timeout_seconds)),
            Commands::Stream {
                timeout_seconds, ..
            }
            | Commands::Info {
                timeout_seconds, ..
            } => timeout_seconds.map(Duration::from_secs),
            Commands::Tools { .. } => None,
        }
    }

    fn backend(&self) -> BackendMode {
        match self {
            Commands::Extract { backend, .. }
            | Commands::Stream { backend, .. }
            | Commands::Info { backend, .. } => *backend,
            Commands::Tools { .. } => BackendMode::Auto,
        }
    }
}

impl Cli {
    /// Fold the parsed arguments into an [`ExtractorConfig`].
    pub fn to_config(&self) -> ExtractorConfig {
        let opts = &self.options;
        let mut config = ExtractorConfig::default()
            .with_mode(self.command.backend())
            .with_ytdlp_path(opts.ytdlp_path.clone())
            .with_python_cmd(opts.python.clone())
            .with_ffmpeg_path(opts.ffmpeg_path.clone())
            .with_proxy(opts.proxy.clone())
            .with_cookies_path(opts.cookies.clone())
            .with_cookies_from_browser(opts.cookies_from_browser.clone())
            .with_player_client(opts.player_client.clone())
            .with_socket_timeout(opts.socket_timeout)
            .with_retries(opts.retries)
            .with_timeout(self.command.timeout());

        if let Commands::Extract {
            audio_format,
            audio_quality,
            ..
        } = &self.command
        {
            config = config.with_audio(audio_format.clone(), audio_quality.clone());
        }
        config
    }
}
