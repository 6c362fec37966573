use std::sync::LazyLock;

use regex::Regex;

use super::clean_text;
use crate::Cue;

const CUE_SEPARATOR: &str = "-->";

static CUE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Parse a WebVTT document into cues, in input order
pub fn parse(raw: &str) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut lines = raw.lines();

    while let Some(line) = lines.next() {
        let Some((stamp, _)) = line.split_once(CUE_SEPARATOR) else {
            continue;
        };
        let Some(start) = parse_timestamp(stamp.trim()) else {
            continue;
        };

        let mut text_lines = Vec::new();
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            text_lines.push(line);
        }

        let stripped = CUE_TAG.replace_all(&text_lines.join("\n"), "").into_owned();
        let text = clean_text(&stripped);
        if !text.is_empty() {
            cues.push(Cue::new(start, text));
        }
    }

    cues
}

/// Parse `H:MM:SS.mmm`, `MM:SS.mmm` or a bare seconds value
pub fn parse_timestamp(stamp: &str) -> Option<f64> {
    let normalized = stamp.trim().replace(',', ".");
    let parts = normalized
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        [m, s] => Some(m * 60.0 + s),
        [s] => Some(*s),
        _ => None,
    }
}
