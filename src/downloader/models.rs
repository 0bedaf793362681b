// Common data models for downloader

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

use super::errors::DownloadError;

const UPLOAD_DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year][month][day]");
const PUBLISH_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] 00:00:00");

/// One selectable encoding offered by the host (a yt-dlp format)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStream {
    /// Format ID (e.g., "140", "251")
    pub format_id: String,
    /// Container extension (m4a, webm, mp4)
    pub ext: String,
    /// Audio codec (mp4a, opus, none)
    pub acodec: Option<String>,
    /// Video codec (avc1, vp9, none)
    pub vcodec: Option<String>,
    /// Audio bitrate in kbps
    pub abr: Option<f32>,
    /// File size in bytes
    pub filesize: Option<u64>,
    /// Approximate file size (when exact is unknown)
    pub filesize_approx: Option<u64>,
}

impl AudioStream {
    fn has_codec(codec: &Option<String>) -> bool {
        codec
            .as_deref()
            .map_or(false, |c| !c.is_empty() && c != "none")
    }

    pub fn has_audio(&self) -> bool {
        Self::has_codec(&self.acodec)
    }

    pub fn has_video(&self) -> bool {
        Self::has_codec(&self.vcodec)
    }

    /// Audio track without video
    pub fn only_audio(&self) -> bool {
        self.has_audio() && !self.has_video()
    }

    /// Muxed audio and video
    pub fn progressive(&self) -> bool {
        self.has_audio() && self.has_video()
    }

    pub fn mime_type(&self) -> String {
        let kind = if self.has_video() { "video" } else { "audio" };
        format!("{}/{}", kind, self.ext)
    }

    /// Get effective file size (exact or approximate)
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    pub fn bitrate_label(&self) -> String {
        self.abr
            .map(|abr| format!("{}kbps", abr.round() as u32))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Video information parsed from `yt-dlp --dump-json`
#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// Absent when yt-dlp reports no id
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration_seconds: Option<u64>,
    /// Raw `upload_date` as reported by yt-dlp (YYYYMMDD)
    pub upload_date: Option<String>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub streams: Vec<AudioStream>,
}

impl VideoInfo {
    /// Parse the JSON document printed by `--dump-json`.
    pub fn from_json(stdout: &[u8]) -> Result<Self, DownloadError> {
        let json: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        if !json.is_object() {
            return Err(DownloadError::ParseError(
                "Expected a JSON object from yt-dlp".to_string(),
            ));
        }

        let text = |key: &str| json[key].as_str().map(|s| s.to_string());

        let streams = json["formats"]
            .as_array()
            .map(|formats| formats.iter().map(parse_stream).collect())
            .unwrap_or_default();

        Ok(Self {
            id: text("id"),
            title: text("title"),
            uploader: text("uploader").or_else(|| text("channel")),
            duration_seconds: json["duration"].as_f64().map(|d| d.round() as u64),
            upload_date: text("upload_date"),
            view_count: json["view_count"].as_u64(),
            thumbnail: text("thumbnail"),
            description: text("description"),
            streams,
        })
    }

    /// Publish date rendered as `YYYY-MM-DD 00:00:00`
    pub fn publish_date(&self) -> Option<String> {
        let raw = self.upload_date.as_deref()?;
        let date = Date::parse(raw, UPLOAD_DATE_FORMAT).ok()?;
        date.format(PUBLISH_DATE_FORMAT).ok()
    }

    pub fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            title: self.title.clone(),
            author: self.uploader.clone(),
            length_seconds: self.duration_seconds,
            publish_date: self.publish_date(),
            views: self.view_count,
            thumbnail_url: self.thumbnail.clone(),
            description: self.description.clone(),
            video_id: self.id.clone(),
        }
    }
}

fn parse_stream(f: &serde_json::Value) -> AudioStream {
    AudioStream {
        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
        ext: f["ext"].as_str().unwrap_or("").to_string(),
        acodec: f["acodec"].as_str().map(|s| s.to_string()),
        vcodec: f["vcodec"].as_str().map(|s| s.to_string()),
        abr: f["abr"].as_f64().map(|a| a as f32),
        filesize: f["filesize"].as_u64(),
        filesize_approx: f["filesize_approx"].as_u64(),
    }
}

/// The JSON object printed by `ytaudio info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub length_seconds: Option<u64>,
    pub publish_date: Option<String>,
    pub views: Option<u64>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub video_id: Option<String>,
}

/// Download progress information
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// What a backend is asked to fetch
#[derive(Debug, Clone)]
pub enum DownloadTarget {
    /// `bestaudio/best` then yt-dlp's audio extraction postprocessor
    ExtractAudio { format: String, quality: String },
    /// One specific format, written untouched
    Format { format_id: String },
}

/// Download request passed to backends
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// yt-dlp output template (already `%`-escaped)
    pub output_template: String,
    pub target: DownloadTarget,
}

/// Result of a successful backend download
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Paths yt-dlp printed via `--print after_move:filepath`
    pub reported_paths: Vec<PathBuf>,
}

/// Final artifact of a command
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub elapsed: Duration,
}

impl ExtractionOutcome {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}
