use log::{info, warn};

use crate::fetch::{self, Fetch};
use crate::metadata::{self, PlayerResponse};
use crate::page::PageContext;
use crate::{AggregateResult, CaptionError, ParsedTranscript, Settings, extract_video_id};

/// Resolve every caption track on the page and combine those that fetch
/// successfully, in page declaration order.
pub async fn get_best_transcript<P: PageContext, F: Fetch>(
    page: &P,
    fetcher: &F,
    settings: &Settings,
) -> Result<AggregateResult, CaptionError> {
    let video_id = extract_video_id(page.url()).ok_or(CaptionError::NoVideoId)?;
    let player: PlayerResponse = metadata::resolve_player_metadata(page, settings).await?;

    if let Some(title) = player.title() {
        info!("Resolving captions for {video_id}: {title}");
    }
    if let Some(other) = player.video_id().filter(|id| *id != video_id) {
        warn!("Player metadata describes {other}, page URL names {video_id}");
    }

    let tracks = metadata::list_tracks(&player).map_err(|_| CaptionError::NoCaptionsFound)?;
    info!("Found {} caption tracks", tracks.len());

    let mut parsed = Vec::new();
    for track in &tracks {
        match fetch::fetch_track(fetcher, track, page.url(), settings).await {
            Ok(transcript) => parsed.push(transcript),
            Err(e) => warn!("Dropping track {}: {e}", track.lang),
        }
    }

    if parsed.is_empty() {
        return Err(CaptionError::NoCaptionsFetched);
    }

    Ok(AggregateResult {
        video_id,
        tracks,
        combined: combine(&parsed),
    })
}

/// One labeled section per transcript, separated by blank lines
pub fn combine(sections: &[ParsedTranscript]) -> String {
    sections
        .iter()
        .map(|s| format!("{}\n{}", section_header(s), s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn section_header(section: &ParsedTranscript) -> String {
    let track = &section.track;
    if track.name.is_empty() {
        format!("--- Track: {} ---", track.lang)
    } else {
        format!("--- Track: {} ({}) ---", track.lang, track.name)
    }
}
