// Helper functions shared by backends and commands

use regex::Regex;

use super::errors::DownloadError;

lazy_static::lazy_static! {
    static ref HTTP_URL_RE: Regex = Regex::new(r"^(?i)https?://[^/\s?#]+").unwrap();
    static ref YOUTUBE_ID_RE: Regex = Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})"
    ).unwrap();
}

/// Reject input that is not an absolute http(s) URL with a host.
///
/// Anything beyond that is left to yt-dlp.
pub fn validate_url(url: &str) -> Result<(), DownloadError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(DownloadError::InvalidUrl("empty URL".to_string()));
    }
    if trimmed.chars().any(char::is_whitespace) || !HTTP_URL_RE.is_match(trimmed) {
        return Err(DownloadError::InvalidUrl(trimmed.to_string()));
    }
    Ok(())
}

pub fn is_youtube_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.contains("youtube.com") || lower.contains("youtu.be")
}

/// The 11-character video ID of a YouTube watch/short/embed URL
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
