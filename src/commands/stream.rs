// `stream`: list the streams, pick the best audio one, save it as given

use std::fs;
use std::path::Path;
use std::time::{Instant, SystemTime};

use tracing::{debug, warn};

use super::CommandContext;
use crate::downloader::output::{
    cleanup_partials, is_suspiciously_small, locate_output, run_started, verify_output,
};
use crate::downloader::utils::validate_url;
use crate::downloader::{
    DownloadError, DownloadRequest, DownloadTarget, ExtractionOutcome, OutputPlan, StdoutProgress,
    StreamSelector, StreamTier, Transcoder,
};

pub async fn execute(ctx: &CommandContext, url: &str, output_path: &Path, transcode: bool) -> bool {
    match run(ctx, url, output_path, transcode).await {
        Ok(outcome) => {
            println!("SUCCESS: Audio extracted to {}", outcome.path.display());
            true
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            println!("FAILED: Could not extract audio");
            false
        }
    }
}

pub async fn run(
    ctx: &CommandContext,
    url: &str,
    output_path: &Path,
    transcode: bool,
) -> Result<ExtractionOutcome, DownloadError> {
    println!("Downloading audio from: {}", url);
    println!("Output path: {}", output_path.display());

    validate_url(url)?;
    let plan = OutputPlan::new(output_path)?;

    let started = run_started();
    let result = select_and_download(ctx, url, &plan, transcode, started).await;

    if let Err(e) = &result {
        if e.is_interrupt() {
            let removed = cleanup_partials(&plan.dir, &plan.exact_prefix(), started);
            warn!(removed, "cleaned up partial files");
        }
    }
    result
}

async fn select_and_download(
    ctx: &CommandContext,
    url: &str,
    plan: &OutputPlan,
    transcode: bool,
    started: SystemTime,
) -> Result<ExtractionOutcome, DownloadError> {
    let info = ctx.downloader.fetch_info(url, &ctx.limits).await?;
    println!("Video title: {}", info.title.as_deref().unwrap_or("Unknown"));
    println!("Author: {}", info.uploader.as_deref().unwrap_or("Unknown"));
    match info.duration_seconds {
        Some(seconds) => println!("Length: {} seconds", seconds),
        None => println!("Length: Unknown seconds"),
    }

    println!("Searching for available audio streams...");
    let selection = StreamSelector::select(&info.streams).ok_or(DownloadError::NoAudioStream)?;
    if selection.tier != StreamTier::AudioOnly {
        println!("No audio streams found, trying with progressive streams...");
    }
    if selection.tier == StreamTier::Any {
        println!("No streams found at all, trying with any format...");
    }

    println!("Available audio streams:");
    for line in StreamSelector::listing(&selection) {
        println!("{}", line);
    }

    let stream = selection.best().ok_or(DownloadError::NoAudioStream)?;
    println!(
        "Selected stream: {}, Bitrate: {}",
        stream.mime_type(),
        stream.bitrate_label()
    );

    if let Some(dir) = plan.ensure_dir()? {
        println!("Created output directory: {}", dir.display());
    }

    let (download_path, template) = if transcode {
        (plan.temp_path(), plan.temp_template())
    } else {
        (plan.requested.clone(), plan.exact_template())
    };

    println!("Downloading audio...");
    let request = DownloadRequest {
        url: url.to_string(),
        output_template: template,
        target: DownloadTarget::Format {
            format_id: stream.format_id.clone(),
        },
    };

    let clock = Instant::now();
    let report = ctx
        .downloader
        .download(&request, &ctx.limits, &StdoutProgress)
        .await?;

    let extension = download_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let downloaded = locate_output(&report.reported_paths, &download_path, &extension, started)?;
    verify_output(&downloaded)?;

    let path = if transcode {
        println!("Converting to MP3...");
        let transcoder = Transcoder::new(ctx.tools.ffmpeg.clone(), ctx.config.audio_quality.clone());
        let converted = transcoder
            .to_mp3(&downloaded, &plan.requested, &ctx.limits)
            .await;
        if let Err(e) = fs::remove_file(&downloaded) {
            warn!(file = %downloaded.display(), error = %e, "failed to remove temp file");
        } else {
            debug!(file = %downloaded.display(), "removed temp file");
        }
        converted?;
        plan.requested.clone()
    } else {
        downloaded
    };

    let size_bytes = verify_output(&path)?;
    let outcome = ExtractionOutcome {
        path,
        size_bytes,
        elapsed: clock.elapsed(),
    };
    println!(
        "Audio downloaded and saved to {} ({:.2} MB)",
        outcome.path.display(),
        outcome.size_mb()
    );
    if is_suspiciously_small(size_bytes) {
        println!("Warning: Downloaded file is very small, might be incomplete.");
    }
    Ok(outcome)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::commands::testing::{context, fake_ffmpeg, fake_ytdlp};
    use crate::downloader::ToolCommand;

    #[tokio::test]
    async fn test_stream_saves_exact_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(fake_ytdlp(dir.path(), "webm", ""), fake_ffmpeg(dir.path()), None);

        let output = dir.path().join("out/track.webm");
        let outcome = run(&ctx, "https://youtu.be/dQw4w9WgXcQ", &output, false)
            .await
            .unwrap();

        assert_eq!(outcome.path, output);
        assert_eq!(outcome.size_bytes, 200_000);
    }

    #[tokio::test]
    async fn test_stream_transcode_replaces_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(fake_ytdlp(dir.path(), "webm", ""), fake_ffmpeg(dir.path()), None);

        let output = dir.path().join("track.mp3");
        let outcome = run(&ctx, "https://youtu.be/dQw4w9WgXcQ", &output, true)
            .await
            .unwrap();

        assert_eq!(outcome.path, output);
        assert_eq!(outcome.size_bytes, 150_000);
        assert!(!dir.path().join("track.mp3.temp").exists());
    }

    #[tokio::test]
    async fn test_transcode_failure_is_reported_and_temp_removed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            fake_ytdlp(dir.path(), "webm", ""),
            ToolCommand::new("ytaudio-no-such-ffmpeg"),
            None,
        );

        let output = dir.path().join("track.mp3");
        let err = run(&ctx, "https://youtu.be/dQw4w9WgXcQ", &output, true)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::ToolNotFound(_)));
        assert!(!dir.path().join("track.mp3.temp").exists());
        assert!(!output.exists());
    }
}
