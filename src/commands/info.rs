// `info`: one JSON object with the video metadata

use super::CommandContext;
use crate::downloader::utils::{validate_url, youtube_video_id};
use crate::downloader::{DownloadError, VideoMetadata};

pub async fn execute(ctx: &CommandContext, url: &str) -> bool {
    let rendered = run(ctx, url).await.and_then(|metadata| {
        serde_json::to_string(&metadata)
            .map_err(|e| DownloadError::ParseError(format!("Failed to encode metadata: {}", e)))
    });

    match rendered {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            false
        }
    }
}

pub async fn run(ctx: &CommandContext, url: &str) -> Result<VideoMetadata, DownloadError> {
    validate_url(url)?;
    let info = ctx.downloader.fetch_info(url, &ctx.limits).await?;

    let mut metadata = info.metadata();
    if metadata.video_id.is_none() {
        metadata.video_id = youtube_video_id(url).map(str::to_string);
    }
    Ok(metadata)
}
