use eyre::Result;
use log::{debug, info, warn};
use url::Url;

use crate::formats::{self, CaptionFormat, timedtext};
use crate::{CaptionError, CaptionTrack, ParsedTranscript, Settings};

/// `fmt` values tried before the bare URL, cheapest to detect first
const FORMAT_VARIANTS: [&str; 3] = ["vtt", "json3", "srv3"];

/// Status and text body of an HTTP GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP GET seam used for watch pages and caption tracks
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse>>;
}

impl Fetch for reqwest::Client {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let resp = self.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(FetchResponse { status, body })
    }
}

/// Request URLs for one track, in the order they are tried
pub fn candidate_urls(base: &str, page_url: &str) -> Vec<String> {
    let resolved = Url::parse(base).or_else(|_| Url::parse(page_url).and_then(|page| page.join(base)));

    let mut candidates: Vec<String> = FORMAT_VARIANTS
        .iter()
        .map(|fmt| match &resolved {
            Ok(url) => with_format(url, fmt),
            Err(_) => append_format(base, fmt),
        })
        .collect();
    candidates.push(resolved.map(String::from).unwrap_or_else(|_| base.to_string()));
    candidates
}

fn with_format(url: &Url, fmt: &str) -> String {
    if !url.query_pairs().any(|(k, _)| k == "fmt") {
        return append_format(url.as_str(), fmt);
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(kept).append_pair("fmt", fmt);
    url.to_string()
}

fn append_format(url: &str, fmt: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}fmt={fmt}")
}

/// Fetch one track, trying each candidate URL until one yields text
pub async fn fetch_track_text<F: Fetch>(
    fetcher: &F,
    track: &CaptionTrack,
    page_url: &str,
    settings: &Settings,
) -> Result<String, CaptionError> {
    let Some(base) = track.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        warn!("Track {} has no URL", track.lang);
        return Err(CaptionError::TrackFetchFailed(track.lang.clone()));
    };

    for url in candidate_urls(base, page_url) {
        match try_candidate(fetcher, &url, settings).await {
            Ok(Some(text)) => {
                info!("Track {} fetched from {url}", track.lang);
                return Ok(text);
            }
            Ok(None) => debug!("No usable captions at {url}"),
            Err(e) => warn!("Candidate {url} failed: {e}"),
        }
    }

    Err(CaptionError::TrackFetchFailed(track.lang.clone()))
}

pub async fn fetch_track<F: Fetch>(
    fetcher: &F,
    track: &CaptionTrack,
    page_url: &str,
    settings: &Settings,
) -> Result<ParsedTranscript, CaptionError> {
    let text = fetch_track_text(fetcher, track, page_url, settings).await?;
    Ok(ParsedTranscript {
        track: track.clone(),
        text,
    })
}

async fn try_candidate<F: Fetch>(fetcher: &F, url: &str, settings: &Settings) -> Result<Option<String>> {
    let resp = fetcher.fetch(url).await?;
    if !resp.is_success() {
        debug!("{url} returned HTTP {}", resp.status);
        return Ok(None);
    }
    if resp.body.trim().is_empty() {
        debug!("{url} returned an empty body");
        return Ok(None);
    }
    Ok(extract_text(&resp.body, settings.max_raw_chars))
}

/// Turn a caption body into newline-joined cues: sniffed parser first, then a
/// blind XML attempt, then the cleaned raw text when it is small enough.
pub fn extract_text(body: &str, max_raw_chars: usize) -> Option<String> {
    let sniffed = formats::sniff(body);

    if let Some(format) = sniffed {
        let cues = format.parse(body);
        if !cues.is_empty() {
            debug!("Parsed {} cues as {format}", cues.len());
            return Some(formats::join_cues(&cues));
        }
    }

    if sniffed != Some(CaptionFormat::TimedText) {
        let cues = timedtext::parse(body);
        if !cues.is_empty() {
            debug!("Parsed {} cues with fallback XML parser", cues.len());
            return Some(formats::join_cues(&cues));
        }
    }

    let raw = formats::clean_text(body);
    if !raw.is_empty() && raw.chars().count() < max_raw_chars {
        debug!("Using {} chars of raw caption text", raw.len());
        return Some(raw);
    }
    None
}
