// ffmpeg transcoding for downloads that are not already in the target codec

use std::path::Path;

use tracing::{debug, info};

use super::errors::DownloadError;
use super::process::{run_capture, RunLimits, ToolCommand};

pub struct Transcoder {
    ffmpeg: ToolCommand,
    bitrate_kbps: String,
}

impl Transcoder {
    pub fn new(ffmpeg: ToolCommand, bitrate_kbps: impl Into<String>) -> Self {
        Self {
            ffmpeg,
            bitrate_kbps: bitrate_kbps.into(),
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            input.display().to_string(),
            "-vn".to_string(),
            "-codec:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
            output.display().to_string(),
        ]
    }

    /// Convert `input` to MP3 at `output`, overwriting it.
    pub async fn to_mp3(
        &self,
        input: &Path,
        output: &Path,
        limits: &RunLimits,
    ) -> Result<(), DownloadError> {
        info!(input = %input.display(), output = %output.display(), "transcoding to mp3");
        let result = run_capture(&self.ffmpeg, &self.args(input, output), limits).await;

        let out = match result {
            Ok(out) => out,
            Err(DownloadError::ToolNotFound(detail)) => {
                return Err(DownloadError::ToolNotFound(format!("ffmpeg ({})", detail)))
            }
            Err(e) => return Err(e),
        };

        if !out.status.success() {
            let detail = out
                .stderr_lines
                .iter()
                .rev()
                .map(|l| l.trim())
                .find(|l| !l.is_empty())
                .unwrap_or("no diagnostic output");
            return Err(DownloadError::ExecutionError(format!(
                "ffmpeg exited with {}: {}",
                out.status, detail
            )));
        }

        debug!(output = %output.display(), "transcode finished");
        Ok(())
    }
}
