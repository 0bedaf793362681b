// StreamSelector - picks the audio stream to download
//
// Preference order:
// - audio-only streams, highest bitrate first
// - progressive (muxed audio+video) streams, highest bitrate first
// - anything else, highest bitrate first
// Streams without a known bitrate sort after those that have one.

use std::cmp::Ordering;

use super::models::AudioStream;
use super::utils::bytes_to_mb;

/// How many streams the listing shows
pub const LISTED_STREAMS: usize = 5;

/// Which tier the selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTier {
    AudioOnly,
    Progressive,
    Any,
}

/// Ordered candidates for one tier
#[derive(Debug, Clone)]
pub struct StreamSelection<'a> {
    pub tier: StreamTier,
    pub candidates: Vec<&'a AudioStream>,
}

impl<'a> StreamSelection<'a> {
    pub fn best(&self) -> Option<&'a AudioStream> {
        self.candidates.first().copied()
    }
}

pub struct StreamSelector;

impl StreamSelector {
    /// First non-empty tier, ordered by bitrate descending.
    pub fn select(streams: &[AudioStream]) -> Option<StreamSelection<'_>> {
        let tiers: [(StreamTier, fn(&AudioStream) -> bool); 3] = [
            (StreamTier::AudioOnly, AudioStream::only_audio),
            (StreamTier::Progressive, AudioStream::progressive),
            (StreamTier::Any, |_| true),
        ];

        tiers.into_iter().find_map(|(tier, keep)| {
            let mut candidates: Vec<&AudioStream> = streams.iter().filter(|s| keep(*s)).collect();
            if candidates.is_empty() {
                return None;
            }
            candidates.sort_by(|a, b| Self::by_bitrate_desc(a, b));
            Some(StreamSelection { tier, candidates })
        })
    }

    fn by_bitrate_desc(a: &AudioStream, b: &AudioStream) -> Ordering {
        match (a.abr, b.abr) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// `  1. audio/webm, Bitrate: 160kbps, Size: 3.21 MB`
    pub fn describe(index: usize, stream: &AudioStream) -> String {
        let size = stream
            .effective_size()
            .map(|bytes| format!("{:.2} MB", bytes_to_mb(bytes)))
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            "  {}. {}, Bitrate: {}, Size: {}",
            index + 1,
            stream.mime_type(),
            stream.bitrate_label(),
            size
        )
    }

    /// Listing of the top candidates
    pub fn listing(selection: &StreamSelection<'_>) -> Vec<String> {
        selection
            .candidates
            .iter()
            .take(LISTED_STREAMS)
            .enumerate()
            .map(|(i, s)| Self::describe(i, s))
            .collect()
    }
}
