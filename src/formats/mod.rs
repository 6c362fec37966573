//! Caption serialization formats.
//!
//! Every parser is a pure `&str -> Vec<Cue>` function that never fails: an
//! unreadable body yields an empty vector and the caller decides what to try
//! next.

pub mod json3;
pub mod timedtext;
pub mod vtt;

use crate::Cue;

/// Serialization detected in a caption response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Vtt,
    TimedText,
    Json3,
}

impl CaptionFormat {
    pub fn parse(self, raw: &str) -> Vec<Cue> {
        match self {
            CaptionFormat::Vtt => vtt::parse(raw),
            CaptionFormat::TimedText => timedtext::parse(raw),
            CaptionFormat::Json3 => json3::parse(raw),
        }
    }
}

impl std::fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionFormat::Vtt => write!(f, "vtt"),
            CaptionFormat::TimedText => write!(f, "timedtext"),
            CaptionFormat::Json3 => write!(f, "json3"),
        }
    }
}

/// Guess the serialization of a body from its prefix and a few markers
pub fn sniff(body: &str) -> Option<CaptionFormat> {
    let head = body.trim_start_matches('\u{feff}').trim_start();

    if head.starts_with("WEBVTT") || head.contains("-->") {
        return Some(CaptionFormat::Vtt);
    }
    if head.starts_with('<')
        || head.contains("<transcript")
        || head.contains("<timedtext")
        || head.contains("<text")
    {
        return Some(CaptionFormat::TimedText);
    }
    if head.starts_with('{') || head.starts_with('[') || head.contains("\"events\"") {
        return Some(CaptionFormat::Json3);
    }
    None
}

/// Decode HTML entities, then collapse whitespace runs to single spaces
pub fn clean_text(raw: &str) -> String {
    collapse_whitespace(&html_escape::decode_html_entities(raw))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render cues one per line
pub fn join_cues(cues: &[Cue]) -> String {
    cues.iter().map(Cue::to_string).collect::<Vec<_>>().join("\n")
}
