use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::page::{PageContext, RelayFragment};
use crate::{CaptionError, CaptionTrack, Settings};

/// Name of the global the watch page stores its player response in
pub const PLAYER_RESPONSE_VAR: &str = "ytInitialPlayerResponse";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerResponse {
    #[serde(default)]
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails", default)]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoDetails {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCaptionTrack {
    language_code: String,
    name: Option<TrackName>,
    base_url: Option<String>,
    url: Option<String>,
    kind: Option<String>,
    is_translatable: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn text(&self) -> String {
        match &self.simple_text {
            Some(text) => text.clone(),
            None => self.runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }
}

impl PlayerResponse {
    pub fn title(&self) -> Option<&str> {
        self.video_details.as_ref()?.title.as_deref()
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_details.as_ref()?.video_id.as_deref()
    }

    fn from_value(value: Value, source: &str) -> Option<Self> {
        if !value.is_object() {
            debug!("{source}: player response is not an object");
            return None;
        }
        match serde_json::from_value(value) {
            Ok(resp) => Some(resp),
            Err(e) => {
                warn!("{source}: player response has an unexpected shape: {e}");
                None
            }
        }
    }
}

/// Obtain the page's player response: direct read, then the cross-context
/// relay, then a scan of inline script text.
pub async fn resolve_player_metadata<P: PageContext>(
    page: &P,
    settings: &Settings,
) -> Result<PlayerResponse, CaptionError> {
    if let Some(resp) = page
        .player_response()
        .and_then(|v| PlayerResponse::from_value(v, "direct read"))
    {
        info!("Player metadata resolved by direct read");
        return Ok(resp);
    }

    if let Some(resp) = relay_player_response(page, settings.relay_timeout)
        .await
        .and_then(|v| PlayerResponse::from_value(v, "relay"))
    {
        info!("Player metadata resolved through page relay");
        return Ok(resp);
    }

    for (index, script) in page.inline_scripts().iter().enumerate() {
        if let Some(resp) = scan_script(script) {
            info!("Player metadata resolved from inline script #{index}");
            return Ok(resp);
        }
    }

    Err(CaptionError::MetadataNotFound)
}

/// Ask the page's own context for the global and wait, bounded, for the
/// tagged reply. Timing out is a miss, not an error.
async fn relay_player_response<P: PageContext>(page: &P, timeout: Duration) -> Option<Value> {
    let Some(mut messages) = page.messages() else {
        debug!("Page has no script context, skipping relay");
        return None;
    };

    let fragment = RelayFragment {
        marker: format!("ytcap-relay-{}", uuid::Uuid::new_v4()),
        global: PLAYER_RESPONSE_VAR,
    };
    let script = page.inject(&fragment)?;
    page.remove(script);

    let wait = async {
        loop {
            match messages.recv().await {
                Ok(msg) if msg.marker == fragment.marker => return Some(msg.payload),
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Relay listener lagged by {skipped} messages");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(Some(payload)) if !payload.is_null() => Some(payload),
        Ok(_) => None,
        Err(_) => {
            debug!("Relay gave no answer within {timeout:?}");
            None
        }
    }
}

/// Find the player response literal in one script's text
fn scan_script(script: &str) -> Option<PlayerResponse> {
    for (pos, _) in script.match_indices(PLAYER_RESPONSE_VAR) {
        let Some(literal) = extract_balanced_object(&script[pos + PLAYER_RESPONSE_VAR.len()..]) else {
            continue;
        };
        match serde_json::from_str::<Value>(literal) {
            Ok(value) => {
                if let Some(resp) = PlayerResponse::from_value(value, "script scan") {
                    return Some(resp);
                }
            }
            Err(e) => debug!("Candidate player response literal did not parse: {e}"),
        }
    }
    None
}

/// Return the balanced `{...}` starting at the first `{` in `text`. Braces
/// inside double-quoted strings do not count.
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Normalize the caption track manifest, in page declaration order
pub fn list_tracks(resp: &PlayerResponse) -> Result<Vec<CaptionTrack>, CaptionError> {
    let raw = resp
        .captions
        .as_ref()
        .and_then(|c| c.player_captions_tracklist_renderer.as_ref())
        .and_then(|r| r.caption_tracks.as_deref())
        .unwrap_or_default();

    if raw.is_empty() {
        return Err(CaptionError::NoCaptionTracks);
    }

    Ok(raw
        .iter()
        .map(|t| CaptionTrack {
            lang: t.language_code.clone(),
            name: t.name.as_ref().map(TrackName::text).unwrap_or_default(),
            url: t.base_url.clone().or_else(|| t.url.clone()),
            kind: t.kind.clone().unwrap_or_default(),
            is_translatable: t.is_translatable.unwrap_or(false),
        })
        .collect())
}
