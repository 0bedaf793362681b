// `extract`: best audio through yt-dlp's extract-audio postprocessor

use std::path::Path;
use std::time::{Instant, SystemTime};

use tracing::warn;

use super::CommandContext;
use crate::downloader::output::{
    cleanup_partials, is_suspiciously_small, locate_output, run_started, verify_output,
};
use crate::downloader::utils::validate_url;
use crate::downloader::{
    DownloadError, DownloadRequest, DownloadTarget, ExtractionOutcome, OutputPlan, StdoutProgress,
};

pub async fn execute(ctx: &CommandContext, url: &str, output_path: &Path) -> bool {
    match run(ctx, url, output_path).await {
        Ok(_) => {
            println!("✓ Extraction completed successfully");
            true
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            println!("✗ Extraction failed");
            false
        }
    }
}

pub async fn run(
    ctx: &CommandContext,
    url: &str,
    output_path: &Path,
) -> Result<ExtractionOutcome, DownloadError> {
    println!("Starting extraction for: {}", url);
    println!("Output path: {}", output_path.display());
    if let Some(timeout) = ctx.config.timeout {
        println!("Timeout set to: {} seconds", timeout.as_secs());
    }

    validate_url(url)?;
    let plan = OutputPlan::new(output_path)?;
    if let Some(dir) = plan.ensure_dir()? {
        println!("Created output directory: {}", dir.display());
    }

    let started = run_started();
    let result = fetch_and_extract(ctx, url, &plan, started).await;

    if let Err(e) = &result {
        if e.is_interrupt() {
            let removed = cleanup_partials(&plan.dir, &plan.extract_prefix(), started);
            warn!(removed, "cleaned up partial files");
        }
    }
    result
}

async fn fetch_and_extract(
    ctx: &CommandContext,
    url: &str,
    plan: &OutputPlan,
    started: SystemTime,
) -> Result<ExtractionOutcome, DownloadError> {
    println!("Getting video information...");
    match ctx.downloader.fetch_info(url, &ctx.limits).await {
        Ok(info) => {
            println!(
                "Video title: {}",
                info.title.as_deref().unwrap_or("Unknown")
            );
            match info.duration_seconds {
                Some(seconds) => println!("Duration: {} seconds", seconds),
                None => println!("Duration: Unknown seconds"),
            }
            println!("Available formats: {}", info.streams.len());
        }
        Err(e) if e.is_interrupt() => return Err(e),
        Err(e) => println!("Warning: Could not get video info: {}", e),
    }

    println!("Downloading and extracting audio...");
    let audio_format = ctx.config.audio_format.clone();
    let request = DownloadRequest {
        url: url.to_string(),
        output_template: plan.extract_template(),
        target: DownloadTarget::ExtractAudio {
            format: audio_format.clone(),
            quality: ctx.config.audio_quality.clone(),
        },
    };

    let clock = Instant::now();
    let report = ctx
        .downloader
        .download(&request, &ctx.limits, &StdoutProgress)
        .await?;
    let elapsed = clock.elapsed();
    println!("Download completed in {:.2} seconds", elapsed.as_secs_f64());

    let expected = plan.extract_target(&audio_format);
    let path = locate_output(&report.reported_paths, &expected, &audio_format, started)?;
    let size_bytes = verify_output(&path)?;

    let outcome = ExtractionOutcome {
        path,
        size_bytes,
        elapsed,
    };
    println!(
        "Success! Audio saved to: {} ({:.2} MB)",
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
    use crate::commands::testing::{context, fake_ffmpeg, fake_ytdlp, fake_ytdlp_with_info};
    use std::time::Duration;

    #[tokio::test]
    async fn test_extract_writes_mp3_next_to_requested_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            fake_ytdlp(dir.path(), "mp3", ""),
            fake_ffmpeg(dir.path()),
            Some(Duration::from_secs(60)),
        );

        let output = dir.path().join("music/song.mp4");
        let outcome = run(&ctx, "https://www.youtube.com/watch?v=dQw4w9WgXcQ", &output)
            .await
            .unwrap();

        assert_eq!(outcome.path, dir.path().join("music/song.mp3"));
        assert_eq!(outcome.size_bytes, 200_000);
        assert!(outcome.path.is_file());
    }

    #[tokio::test]
    async fn test_extract_continues_when_info_fetch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let no_info = r#"echo "ERROR: [youtube] dQw4w9WgXcQ: Unable to extract player response" >&2
  exit 1"#;
        let ctx = context(
            fake_ytdlp_with_info(dir.path(), no_info, "mp3", ""),
            fake_ffmpeg(dir.path()),
            Some(Duration::from_secs(60)),
        );

        let output = dir.path().join("song.mp3");
        let outcome = run(&ctx, "https://www.youtube.com/watch?v=dQw4w9WgXcQ", &output)
            .await
            .unwrap();

        assert_eq!(outcome.path, output);
        assert_eq!(outcome.size_bytes, 200_000);
        assert!(output.is_file());
    }

    #[tokio::test]
    async fn test_extract_rejects_bad_url_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            fake_ytdlp(dir.path(), "mp3", ""),
            fake_ffmpeg(dir.path()),
            None,
        );
        let err = run(&ctx, "not a url", &dir.path().join("a.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_timeout_kills_download_and_removes_partials() {
        let dir = tempfile::tempdir().unwrap();
        // Leave a .part file behind, then hang
        let hang = r#"printf x > "$file.part"
exec sleep 30"#;
        let ctx = context(
            fake_ytdlp(dir.path(), "webm", hang),
            fake_ffmpeg(dir.path()),
            Some(Duration::from_secs(2)),
        );

        let output = dir.path().join("song.mp3");
        let clock = Instant::now();
        let err = run(&ctx, "https://youtu.be/dQw4w9WgXcQ", &output)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TimedOut { seconds: 2 }));
        assert!(clock.elapsed() < Duration::from_secs(20));
        assert!(!dir.path().join("song.webm.part").exists());
        assert!(!output.exists());
    }
}
