// Output path planning, discovery and verification

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use super::errors::DownloadError;
use super::utils::bytes_to_mb;

/// Files below this size (in MB) are reported as possibly incomplete
pub const SMALL_FILE_MB: f64 = 0.1;

/// File timestamps come from a coarser clock than `SystemTime::now`
const MTIME_SLACK: Duration = Duration::from_secs(1);

/// Reference time for "files created by this run"
pub fn run_started() -> SystemTime {
    SystemTime::now()
        .checked_sub(MTIME_SLACK)
        .unwrap_or(UNIX_EPOCH)
}

/// Where a command writes, derived from the user's output path
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPlan {
    /// Absolute parent directory
    pub dir: PathBuf,
    /// The path as requested, made absolute
    pub requested: PathBuf,
}

impl OutputPlan {
    pub fn new(output_path: &Path) -> Result<Self, DownloadError> {
        if output_path.as_os_str().is_empty() {
            return Err(invalid_output("output path is empty"));
        }
        if output_path.is_dir() {
            return Err(invalid_output(&format!(
                "output path {} is a directory",
                output_path.display()
            )));
        }

        let requested = if output_path.is_absolute() {
            output_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(output_path)
        };

        let file_name = requested
            .file_name()
            .ok_or_else(|| invalid_output("output path has no file name"))?;
        if file_name.is_empty() {
            return Err(invalid_output("output path has no file name"));
        }

        let dir = requested
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| invalid_output("output path has no parent directory"))?;

        Ok(Self { dir, requested })
    }

    /// Create the parent directory; returns it when it had to be created.
    pub fn ensure_dir(&self) -> Result<Option<&Path>, DownloadError> {
        if self.dir.is_dir() {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        Ok(Some(&self.dir))
    }

    fn stem(&self) -> String {
        self.requested
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn file_name(&self) -> String {
        self.requested
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `<dir>/<stem>.%(ext)s`; the postprocessor picks the final extension.
    pub fn extract_template(&self) -> String {
        let path = self.dir.join(format!("{}.%(ext)s", escape_template(&self.stem())));
        escape_dir(&self.dir, &path)
    }

    /// Final file of an audio extraction
    pub fn extract_target(&self, audio_format: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem(), audio_format))
    }

    /// The requested path itself, as a yt-dlp template
    pub fn exact_template(&self) -> String {
        let path = self.dir.join(escape_template(&self.file_name()));
        escape_dir(&self.dir, &path)
    }

    /// Sibling of the requested path with `.temp` appended
    pub fn temp_path(&self) -> PathBuf {
        self.dir.join(format!("{}.temp", self.file_name()))
    }

    /// [`Self::temp_path`] as a yt-dlp template
    pub fn temp_template(&self) -> String {
        let path = self.dir.join(escape_template(&format!("{}.temp", self.file_name())));
        escape_dir(&self.dir, &path)
    }

    /// File name prefix shared by everything an extraction writes
    pub fn extract_prefix(&self) -> String {
        format!("{}.", self.stem())
    }

    /// File name prefix shared by everything an exact download writes
    pub fn exact_prefix(&self) -> String {
        self.file_name()
    }
}

fn invalid_output(message: &str) -> DownloadError {
    DownloadError::Io(io::Error::new(io::ErrorKind::InvalidInput, message.to_string()))
}

/// yt-dlp treats `%` as the start of a template field
pub fn escape_template(raw: &str) -> String {
    raw.replace('%', "%%")
}

fn escape_dir(dir: &Path, path: &Path) -> String {
    let dir_text = dir.display().to_string();
    let full = path.display().to_string();
    match full.strip_prefix(&dir_text) {
        Some(rest) => format!("{}{}", escape_template(&dir_text), rest),
        None => full,
    }
}

/// Find the file a download produced.
///
/// Order: what yt-dlp reported, the expected path, then the newest file
/// with `extension` in `dir` that was modified at or after `since`.
pub fn locate_output(
    reported: &[PathBuf],
    expected: &Path,
    extension: &str,
    since: SystemTime,
) -> Result<PathBuf, DownloadError> {
    if let Some(path) = reported.iter().rev().find(|p| p.is_file()) {
        debug!(path = %path.display(), "output reported by yt-dlp");
        return Ok(path.clone());
    }

    if expected.is_file() {
        return Ok(expected.to_path_buf());
    }

    let dir = expected.parent().unwrap_or_else(|| Path::new("."));
    warn!(expected = %expected.display(), "expected output missing, scanning directory");

    let newest = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            let matches_ext = path
                .extension()
                .map_or(false, |e| e.to_string_lossy().eq_ignore_ascii_case(extension));
            if !matches_ext || !path.is_file() {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            (modified >= since).then_some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path);

    newest.ok_or_else(|| DownloadError::OutputMissing(expected.to_path_buf()))
}

/// Size in bytes of a non-empty output file
pub fn verify_output(path: &Path) -> Result<u64, DownloadError> {
    let size = fs::metadata(path)?.len();
    if size == 0 {
        return Err(DownloadError::EmptyOutput(path.to_path_buf()));
    }
    Ok(size)
}

pub fn is_suspiciously_small(size_bytes: u64) -> bool {
    bytes_to_mb(size_bytes) < SMALL_FILE_MB
}

/// Remove what an interrupted run left behind: files in `dir` whose name
/// starts with `prefix` and that were modified at or after `since`.
pub fn cleanup_partials(dir: &Path, prefix: &str, since: SystemTime) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) {
            continue;
        }
        let fresh = entry
            .metadata()
            .and_then(|m| m.modified())
            .map_or(false, |modified| modified >= since);
        if !fresh {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!(file = %name, "removed partial download");
                removed += 1;
            }
            Err(e) => warn!(file = %name, error = %e, "failed to remove partial download"),
        }
    }
    removed
}
