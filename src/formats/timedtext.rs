use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::clean_text;
use crate::Cue;

/// Parse YouTube timed-text XML (legacy `<text>` or srv3 `<p>` elements)
pub fn parse(raw: &str) -> Vec<Cue> {
    let result = collect(raw, b"text").and_then(|(found, cues)| {
        if found > 0 {
            Ok(cues)
        } else {
            collect(raw, b"p").map(|(_, cues)| cues)
        }
    });

    match result {
        Ok(cues) => cues,
        Err(e) => {
            debug!("Timed-text XML unreadable: {e}");
            Vec::new()
        }
    }
}

/// Walk the document collecting every `tag` element; returns how many were
/// seen along with the non-empty cues built from them.
fn collect(xml: &str, tag: &[u8]) -> Result<(usize, Vec<Cue>), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut cues = Vec::new();
    let mut found = 0;
    let mut current: Option<(f64, String)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                if current.is_some() {
                    depth += 1;
                } else if e.name().as_ref() == tag {
                    found += 1;
                    current = Some((start_seconds(e), String::new()));
                    depth = 0;
                }
            }
            Event::Empty(ref e) => {
                if let Some((_, text)) = current.as_mut() {
                    if e.name().as_ref() == b"br" {
                        text.push(' ');
                    }
                } else if e.name().as_ref() == tag {
                    found += 1;
                }
            }
            Event::Text(ref e) => {
                if let Some((_, text)) = current.as_mut() {
                    match e.unescape() {
                        Ok(t) => text.push_str(&t),
                        Err(_) => text.push_str(&String::from_utf8_lossy(e)),
                    }
                }
            }
            Event::CData(ref e) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some((start, text)) = current.take() {
                            let text = clean_text(&text);
                            if !text.is_empty() {
                                cues.push(Cue::new(start, text));
                            }
                        }
                    } else {
                        depth -= 1;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((found, cues))
}

/// `start` is in seconds; srv3's `t` is in milliseconds
fn start_seconds(e: &BytesStart) -> f64 {
    let mut start = None;
    let mut offset_ms = None;
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
        match attr.key.as_ref() {
            b"start" => start = value,
            b"t" => offset_ms = value,
            _ => {}
        }
    }
    start.or(offset_ms.map(|ms| ms / 1000.0)).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_transcript() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.21" dur="2.34">Hello world</text>
    <text start="2.55" dur="1.50">This is
    a test</text>
</transcript>"#;

        let cues = parse(xml);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].to_string(), "[0.21s] Hello world");
        assert_eq!(cues[1].to_string(), "[2.55s] This is a test");
    }

    #[test]
    fn test_parse_double_escaped_entities() {
        let xml = r#"<transcript><text start="0.0" dur="1.0">it&amp;#39;s a &amp;quot;test&amp;quot;</text></transcript>"#;
        let cues = parse(xml);
        assert_eq!(cues, vec![Cue::new(0.0, "it's a \"test\"")]);
    }

    #[test]
    fn test_parse_srv3_paragraphs() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<timedtext format="3">
<body>
<p t="1500" d="2000"><s>Hello</s><s t="400"> there</s></p>
<p t="4000" d="1000">line one<br/>line two</p>
<p t="6000" d="1000">
</p>
</body>
</timedtext>"#;

        let cues = parse(xml);
        assert_eq!(cues, vec![Cue::new(1.5, "Hello there"), Cue::new(4.0, "line one line two")]);
    }

    #[test]
    fn test_parse_missing_start_defaults_to_zero() {
        let xml = r#"<transcript><text>no timing</text></transcript>"#;
        assert_eq!(parse(xml), vec![Cue::new(0.0, "no timing")]);
    }

    #[test]
    fn test_text_elements_take_precedence_over_paragraphs() {
        let xml = r#"<doc><text start="1">from text</text><p t="5000">from p</p></doc>"#;
        assert_eq!(parse(xml), vec![Cue::new(1.0, "from text")]);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(parse(r#"<?xml version="1.0"?><transcript></transcript>"#).is_empty());
        assert!(parse("<transcript><text start=\"1\">open</p></transcript>").is_empty());
        assert!(parse("WEBVTT").is_empty());
    }
}
