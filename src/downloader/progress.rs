// yt-dlp progress line parsing

use regex::Regex;

use super::models::DownloadProgress;

lazy_static::lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+(?:\s*\w+/s)?))?(?:\s+ETA\s+(\S+))?(?:\s+\(frag\s+(\d+)/(\d+)\))?"
    ).unwrap();
    static ref DONE_RE: Regex = Regex::new(
        r"\[download\]\s+100%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)\s+in\s+(\S+)"
    ).unwrap();
    static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
    static ref EXTRACT_RE: Regex = Regex::new(r"\[ExtractAudio\]\s+Destination:\s+(.+)").unwrap();
    static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
}

/// Parse yt-dlp progress line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
pub fn parse_ytdlp_progress(line: &str) -> Option<DownloadProgress> {
    if let Some(caps) = DONE_RE.captures(line) {
        let size = caps.get(1).map(|m| m.as_str()).unwrap_or("?");
        let took = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        return Some(DownloadProgress {
            percent: 100.0,
            status: format!("finished 100% of {} in {}", size, took),
        });
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str());
        let eta = caps.get(4).map(|m| m.as_str());
        let frag = match (caps.get(5), caps.get(6)) {
            (Some(current), Some(total)) => Some((current.as_str(), total.as_str())),
            _ => None,
        };

        let mut status = format!("downloading {:.1}% of {}", percent, size);
        if let Some(speed) = speed {
            status.push_str(&format!(" at {}", speed));
        }
        if let Some(eta) = eta {
            status.push_str(&format!(" ETA {}", eta));
        }
        if let Some((current, total)) = frag {
            status.push_str(&format!(" (frag {}/{})", current, total));
        }

        return Some(DownloadProgress { percent, status });
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        return Some(DownloadProgress {
            percent: 0.0,
            status: format!("started {}", filename.trim()),
        });
    }

    if let Some(caps) = EXTRACT_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        return Some(DownloadProgress {
            percent: 100.0,
            status: format!("converting to {}", filename.trim()),
        });
    }

    if ALREADY_RE.is_match(line) {
        return Some(DownloadProgress {
            percent: 100.0,
            status: "file already downloaded".to_string(),
        });
    }

    None
}
