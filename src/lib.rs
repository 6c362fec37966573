pub mod backend;
pub mod config;
pub mod error;
pub mod fetch;
pub mod formats;
pub mod messaging;
pub mod metadata;
pub mod output;
pub mod page;
pub mod transcript;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use error::CaptionError;

/// One selectable caption stream as advertised by the watch page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub lang: String,
    pub name: String,
    pub url: Option<String>,
    pub kind: String,
    pub is_translatable: bool,
}

/// A single timed caption utterance
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub text: String,
}

impl Cue {
    pub fn new(start: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Cue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}s] {}", self.start, self.text)
    }
}

/// Flattened cue text for one track
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTranscript {
    pub track: CaptionTrack,
    pub text: String,
}

/// Final result of one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub video_id: String,
    pub tracks: Vec<CaptionTrack>,
    pub combined: String,
}

/// Runtime knobs for metadata resolution and track fetching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Bounded wait for the cross-context relay
    pub relay_timeout: Duration,
    /// Largest raw body accepted as a last-resort transcript
    pub max_raw_chars: usize,
}

pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_MAX_RAW_CHARS: usize = 200_000;

impl Default for Settings {
    fn default() -> Self {
        Self {
            relay_timeout: Duration::from_millis(DEFAULT_RELAY_TIMEOUT_MS),
            max_raw_chars: DEFAULT_MAX_RAW_CHARS,
        }
    }
}

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtube\.com/watch\?(?:.*&)?v=([a-zA-Z0-9_-]{11})",
        r"youtu\.be/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/embed/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/shorts/([a-zA-Z0-9_-]{11})",
        r"youtube\.com/live/([a-zA-Z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(input).map(|caps| caps[1].to_string()))
}
