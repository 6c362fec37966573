use log::debug;
use serde_json::Value;

use super::clean_text;
use crate::Cue;

const TEXT_KEYS: [&str; 3] = ["utf8", "t", "w"];

/// Parse the JSON event format (`fmt=json3`)
pub fn parse(raw: &str) -> Vec<Cue> {
    let doc: Value = match serde_json::from_str(raw) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("JSON caption body unreadable: {e}");
            return Vec::new();
        }
    };

    doc.get("events")
        .and_then(Value::as_array)
        .map(|events| events.iter().filter_map(event_cue).collect())
        .unwrap_or_default()
}

fn event_cue(event: &Value) -> Option<Cue> {
    let start_ms = event
        .get("tStartMs")
        .and_then(Value::as_f64)
        .or_else(|| event.get("tOffsetMs").and_then(Value::as_f64))
        .unwrap_or(0.0);

    let pieces = event
        .get("segs")
        .and_then(Value::as_array)
        .or_else(|| event.get("a").and_then(Value::as_array))?;

    let joined: String = pieces
        .iter()
        .filter_map(|seg| TEXT_KEYS.iter().find_map(|key| seg.get(*key).and_then(Value::as_str)))
        .collect();

    let text = clean_text(&joined);
    if text.is_empty() {
        return None;
    }
    Some(Cue::new(start_ms / 1000.0, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_event() {
        let raw = r#"{ "events": [{ "tStartMs": 1500, "segs": [{"utf8": "hi"}] }] }"#;
        let cues: Vec<String> = parse(raw).iter().map(Cue::to_string).collect();
        assert_eq!(cues, vec!["[1.5s] hi"]);
    }

    #[test]
    fn test_parse_youtube_shape() {
        let raw = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 5000, "id": 1, "wpWinPosId": 1},
                {"tStartMs": 160, "dDurationMs": 4000, "segs": [{"utf8": "we"}, {"utf8": " can&#39;t", "tOffsetMs": 400}]},
                {"tStartMs": 2000, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tOffsetMs": 3000, "a": [{"t": "legacy"}, {"w": " piece"}]}
            ]
        }"#;
        let cues = parse(raw);
        assert_eq!(cues, vec![Cue::new(0.16, "we can't"), Cue::new(3.0, "legacy piece")]);
    }

    #[test]
    fn test_parse_missing_start_defaults_to_zero() {
        let raw = r#"{"events": [{"segs": [{"utf8": "untimed"}]}]}"#;
        assert_eq!(parse(raw), vec![Cue::new(0.0, "untimed")]);
    }

    #[test]
    fn test_parse_not_json() {
        assert!(parse("WEBVTT").is_empty());
        assert!(parse("[1, 2, 3]").is_empty());
        assert!(parse(r#"{"events": "nope"}"#).is_empty());
    }
}
