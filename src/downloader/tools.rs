// External tool discovery: yt-dlp, the python yt_dlp module and ffmpeg

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::process::{run_capture, RunLimits, ToolCommand};

const VERSION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    PythonYtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::PythonYtDlp => "python yt_dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

/// Search PATH, then the usual install prefixes.
pub fn locate_binary(binary_name: &str) -> Option<PathBuf> {
    if let Ok(path) = which::which(binary_name) {
        return Some(path);
    }

    let mut prefixes = vec![
        PathBuf::from("/opt/homebrew/bin"), // Homebrew on Apple Silicon
        PathBuf::from("/usr/local/bin"),    // Homebrew on Intel Mac
        PathBuf::from("/usr/bin"),
    ];
    // pip install --user
    if let Some(home) = dirs::home_dir() {
        prefixes.push(home.join(".local").join("bin"));
    }

    prefixes
        .into_iter()
        .map(|prefix| prefix.join(binary_name))
        .find(|candidate| candidate.is_file())
}

/// Python interpreter, `python3` preferred
pub fn locate_python() -> Option<PathBuf> {
    ["python3", "python"].into_iter().find_map(locate_binary)
}

/// Resolved commands for every tool, honouring explicit paths in the config
#[derive(Debug, Clone)]
pub struct ToolSet {
    pub ytdlp: ToolCommand,
    pub python_ytdlp: ToolCommand,
    pub ffmpeg: ToolCommand,
}

impl ToolSet {
    pub fn resolve(config: &ExtractorConfig) -> Self {
        let ytdlp = config
            .ytdlp_path
            .clone()
            .or_else(|| locate_binary("yt-dlp"))
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));

        let python = config
            .python_cmd
            .as_ref()
            .map(PathBuf::from)
            .or_else(locate_python)
            .unwrap_or_else(|| PathBuf::from("python3"));

        let ffmpeg = config
            .ffmpeg_path
            .clone()
            .or_else(|| locate_binary("ffmpeg"))
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));

        Self {
            ytdlp: ToolCommand::new(ytdlp),
            python_ytdlp: ToolCommand::new(python).with_base_args(["-m", "yt_dlp"]),
            ffmpeg: ToolCommand::new(ffmpeg),
        }
    }
}

pub struct ToolManager {
    tools: ToolSet,
}

impl ToolManager {
    pub fn new(tools: ToolSet) -> Self {
        Self { tools }
    }

    pub async fn get_tool_info(
        &self,
        tool_type: ToolType,
        limits: &RunLimits,
    ) -> Result<ToolInfo, DownloadError> {
        let (command, version_arg) = match tool_type {
            ToolType::YtDlp => (&self.tools.ytdlp, "--version"),
            ToolType::PythonYtDlp => (&self.tools.python_ytdlp, "--version"),
            ToolType::Ffmpeg => (&self.tools.ffmpeg, "-version"),
        };

        let version = query_version(command, version_arg, limits).await?;
        let path = version
            .as_ref()
            .map(|_| command.program().display().to_string());

        Ok(ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            is_available: version.is_some(),
            version,
            path,
        })
    }

    pub async fn get_all_tools(&self, limits: &RunLimits) -> Result<Vec<ToolInfo>, DownloadError> {
        Ok(vec![
            self.get_tool_info(ToolType::YtDlp, limits).await?,
            self.get_tool_info(ToolType::PythonYtDlp, limits).await?,
            self.get_tool_info(ToolType::Ffmpeg, limits).await?,
        ])
    }
}

/// Run `<tool> <arg>` and return a cleaned-up version string on success.
///
/// The query shares the command's token and deadline, capped at
/// [`VERSION_TIMEOUT`]. A hung or failing tool is `Ok(None)`; expiry of the
/// command's own deadline or cancellation is an error.
pub async fn query_version(
    command: &ToolCommand,
    arg: &str,
    limits: &RunLimits,
) -> Result<Option<String>, DownloadError> {
    let query_limits = limits.capped(VERSION_TIMEOUT);
    match run_capture(command, &[arg.to_string()], &query_limits).await {
        Ok(output) if output.status.success() => Ok(clean_version(&output.stdout_text())),
        Ok(_) => Ok(None),
        Err(e) if e.is_interrupt() => {
            // Only the version cap expired when the command limits still hold
            limits.check()?;
            Ok(None)
        }
        Err(_) => Ok(None),
    }
}

/// `ffmpeg version 6.1.1 Copyright ...` -> `6.1.1`; `2024.08.06` stays as is
fn clean_version(stdout: &str) -> Option<String> {
    let first = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    if let Some(rest) = first.strip_prefix("ffmpeg version ") {
        return rest.split_whitespace().next().map(|v| v.to_string());
    }
    Some(first.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_version() {
        assert_eq!(
            clean_version("ffmpeg version 6.1.1 Copyright (c) 2000-2023\nbuilt with gcc"),
            Some("6.1.1".to_string())
        );
        assert_eq!(clean_version("\n2024.08.06\n"), Some("2024.08.06".to_string()));
        assert_eq!(clean_version(""), None);
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = ExtractorConfig::default()
            .with_ytdlp_path(Some(PathBuf::from("/custom/yt-dlp")))
            .with_python_cmd(Some("/venv/bin/python".to_string()))
            .with_ffmpeg_path(Some(PathBuf::from("/custom/ffmpeg")));
        let tools = ToolSet::resolve(&config);

        assert_eq!(tools.ytdlp, ToolCommand::new("/custom/yt-dlp"));
        assert_eq!(
            tools.python_ytdlp,
            ToolCommand::new("/venv/bin/python").with_base_args(["-m", "yt_dlp"])
        );
        assert_eq!(tools.ffmpeg, ToolCommand::new("/custom/ffmpeg"));
    }

    #[test]
    fn test_locate_missing_binary() {
        assert!(locate_binary("ytaudio-no-such-tool-anywhere").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_query_through_fake_tool() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "echo 'ffmpeg version 7.0 Copyright (c) 2000-2024'").unwrap();
        drop(file);

        let command = ToolCommand::new("sh").with_base_args([path]);
        let limits = RunLimits::unbounded();
        assert_eq!(
            query_version(&command, "-version", &limits).await.unwrap(),
            Some("7.0".to_string())
        );

        let missing = ToolCommand::new("ytaudio-no-such-tool-anywhere");
        assert_eq!(query_version(&missing, "--version", &limits).await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_query_honours_command_deadline_and_token() {
        use std::io::Write;
        use tokio_util::sync::CancellationToken;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "sleep 5\necho 1.0").unwrap();
        drop(file);
        let command = ToolCommand::new("sh").with_base_args([path]);

        let clock = std::time::Instant::now();
        let limits = RunLimits::new(Some(Duration::from_millis(500)), CancellationToken::new());
        let err = query_version(&command, "--version", &limits).await.unwrap_err();
        assert!(matches!(err, DownloadError::TimedOut { seconds: 1 }));
        assert!(clock.elapsed() < Duration::from_secs(3));

        let cancel = CancellationToken::new();
        let limits = RunLimits::new(None, cancel.clone());
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        });
        let err = query_version(&command, "--version", &limits).await.unwrap_err();
        trigger.await.unwrap();
        assert!(matches!(err, DownloadError::Cancelled));
    }
}
