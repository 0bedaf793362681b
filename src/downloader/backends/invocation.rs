// yt-dlp argument building and execution shared by both backends

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::config::ExtractorConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadReport, DownloadRequest, DownloadTarget, VideoInfo};
use crate::downloader::process::{run_capture, run_streaming, OutputStream, RunLimits, ToolCommand};
use crate::downloader::progress::parse_ytdlp_progress;
use crate::downloader::traits::ProgressSink;
use crate::downloader::utils::is_youtube_url;

/// Builds yt-dlp command lines from an [`ExtractorConfig`]
pub struct YtDlpInvocation<'a> {
    config: &'a ExtractorConfig,
}

impl<'a> YtDlpInvocation<'a> {
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self { config }
    }

    /// Network, auth and tool-location flags used by every call
    fn common_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--socket-timeout".to_string(),
            self.config.socket_timeout.to_string(),
        ];

        if let Some(retries) = self.config.retries {
            args.push("--retries".to_string());
            args.push(retries.to_string());
        }

        // Player client for YouTube
        if let Some(client) = &self.config.player_client {
            if is_youtube_url(url) {
                args.push("--extractor-args".to_string());
                args.push(format!("youtube:player_client={}", client));
            }
        }

        // Cookies
        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.display().to_string());
        } else if let Some(browser) = &self.config.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        // Proxy
        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        if let Some(ffmpeg) = &self.config.ffmpeg_path {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.display().to_string());
        }

        args
    }

    pub fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string()];
        args.extend(self.common_args(url));
        args.push(url.to_string());
        args
    }

    pub fn download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let mut args = vec![
            "--newline".to_string(),
            "--progress".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            "-o".to_string(),
            request.output_template.clone(),
        ];
        args.extend(self.common_args(&request.url));

        match &request.target {
            DownloadTarget::ExtractAudio { format, quality } => {
                args.extend([
                    "-f".to_string(),
                    "bestaudio/best".to_string(),
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    format.clone(),
                    "--audio-quality".to_string(),
                    format!("{}K", quality),
                ]);
            }
            DownloadTarget::Format { format_id } => {
                args.extend(["-f".to_string(), format_id.clone()]);
            }
        }

        args.push(request.url.clone());
        args
    }
}

/// `--dump-json` and parse
pub async fn fetch_info_with(
    tool: &ToolCommand,
    config: &ExtractorConfig,
    url: &str,
    limits: &RunLimits,
) -> Result<VideoInfo, DownloadError> {
    let args = YtDlpInvocation::new(config).info_args(url);
    let output = run_capture(tool, &args, limits).await?;

    if !output.status.success() {
        return Err(DownloadError::from_stderr(&output.stderr_text()));
    }

    VideoInfo::from_json(output.stdout_text().as_bytes())
}

/// Download, forwarding parsed progress to `progress`
pub async fn download_with(
    tool: &ToolCommand,
    config: &ExtractorConfig,
    request: &DownloadRequest,
    limits: &RunLimits,
    progress: &dyn ProgressSink,
) -> Result<DownloadReport, DownloadError> {
    let args = YtDlpInvocation::new(config).download_args(request);

    let output = run_streaming(tool, &args, limits, |stream, line| {
        if let Some(update) = parse_ytdlp_progress(line) {
            progress.emit(update);
        } else if stream == OutputStream::Stderr {
            debug!(target: "ytdlp", "{}", line);
        } else {
            trace!(target: "ytdlp", "{}", line);
        }
    })
    .await?;

    if !output.status.success() {
        return Err(DownloadError::from_stderr(&output.stderr_text()));
    }

    Ok(DownloadReport {
        reported_paths: reported_paths(&output.stdout_lines),
    })
}

/// Lines printed by `--print after_move:filepath`
fn reported_paths(stdout_lines: &[String]) -> Vec<PathBuf> {
    stdout_lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .filter(|line| parse_ytdlp_progress(line).is_none())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: DownloadTarget) -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            output_template: "/tmp/out/song.%(ext)s".to_string(),
            target,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    }

    #[test]
    fn test_info_args() {
        let config = ExtractorConfig::default();
        let args = YtDlpInvocation::new(&config).info_args("https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(args[0], "--dump-json");
        assert_eq!(value_after(&args, "--socket-timeout"), Some("30"));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(!args.contains(&"--proxy".to_string()));
        assert!(!args.contains(&"--retries".to_string()));
        assert_eq!(args.last().map(|s| s.as_str()), Some("https://youtu.be/dQw4w9WgXcQ"));
    }

    #[test]
    fn test_extract_audio_args() {
        let config = ExtractorConfig::default()
            .with_proxy(Some("socks5://127.0.0.1:1080".to_string()))
            .with_cookies_from_browser(Some("firefox".to_string()))
            .with_retries(Some(3));
        let args = YtDlpInvocation::new(&config).download_args(&request(
            DownloadTarget::ExtractAudio {
                format: "mp3".to_string(),
                quality: "192".to_string(),
            },
        ));

        assert_eq!(value_after(&args, "-f"), Some("bestaudio/best"));
        assert!(args.contains(&"-x".to_string()));
        assert_eq!(value_after(&args, "--audio-format"), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("192K"));
        assert_eq!(value_after(&args, "-o"), Some("/tmp/out/song.%(ext)s"));
        assert_eq!(value_after(&args, "--print"), Some("after_move:filepath"));
        assert_eq!(value_after(&args, "--proxy"), Some("socks5://127.0.0.1:1080"));
        assert_eq!(value_after(&args, "--cookies-from-browser"), Some("firefox"));
        assert_eq!(value_after(&args, "--retries"), Some("3"));
    }

    #[test]
    fn test_format_args_and_cookie_file_wins() {
        let config = ExtractorConfig::default()
            .with_cookies_path(Some(PathBuf::from("/tmp/cookies.txt")))
            .with_cookies_from_browser(Some("chrome".to_string()))
            .with_player_client(Some("android".to_string()));
        let args = YtDlpInvocation::new(&config).download_args(&request(DownloadTarget::Format {
            format_id: "251".to_string(),
        }));

        assert_eq!(value_after(&args, "-f"), Some("251"));
        assert!(!args.contains(&"-x".to_string()));
        assert_eq!(value_after(&args, "--cookies"), Some("/tmp/cookies.txt"));
        assert!(!args.contains(&"--cookies-from-browser".to_string()));
        assert_eq!(
            value_after(&args, "--extractor-args"),
            Some("youtube:player_client=android")
        );
    }

    #[test]
    fn test_player_client_only_for_youtube() {
        let config = ExtractorConfig::default().with_player_client(Some("web".to_string()));
        let args = YtDlpInvocation::new(&config).info_args("https://vimeo.com/123");
        assert!(!args.contains(&"--extractor-args".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_reports_progress_and_path() {
        use crate::downloader::traits::RecordingProgress;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("yt-dlp.sh");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(
            file,
            "echo '[download] Destination: /tmp/out/song.webm' >&2\n\
             echo '[download]  42.0% of 3.00MiB at 1.00MiB/s ETA 00:02' >&2\n\
             echo '[ExtractAudio] Destination: /tmp/out/song.mp3' >&2\n\
             echo /tmp/out/song.mp3"
        )
        .unwrap();
        drop(file);

        let tool = ToolCommand::new("sh").with_base_args([script]);
        let progress = RecordingProgress::default();
        let report = download_with(
            &tool,
            &ExtractorConfig::default(),
            &request(DownloadTarget::Format {
                format_id: "251".to_string(),
            }),
            &RunLimits::unbounded(),
            &progress,
        )
        .await
        .unwrap();

        assert_eq!(report.reported_paths, vec![PathBuf::from("/tmp/out/song.mp3")]);
        let statuses: Vec<String> = progress.events().into_iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![
                "started /tmp/out/song.webm".to_string(),
                "downloading 42.0% of 3.00MiB at 1.00MiB/s ETA 00:02".to_string(),
                "converting to /tmp/out/song.mp3".to_string(),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_is_classified() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("yt-dlp.sh");
        let mut file = std::fs::File::create(&script).unwrap();
        writeln!(file, "echo 'ERROR: [youtube] x: Video unavailable' >&2\nexit 1").unwrap();
        drop(file);

        let tool = ToolCommand::new("sh").with_base_args([script]);
        let err = fetch_info_with(
            &tool,
            &ExtractorConfig::default(),
            "https://youtu.be/x",
            &RunLimits::unbounded(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DownloadError::Unavailable(_)));
    }

    #[test]
    fn test_reported_paths_skip_progress() {
        let lines = vec![
            "[download]  50.0% of 3.00MiB at 1.00MiB/s ETA 00:01".to_string(),
            "".to_string(),
            "/tmp/out/song.mp3".to_string(),
        ];
        assert_eq!(reported_paths(&lines), vec![PathBuf::from("/tmp/out/song.mp3")]);
    }
}
