use thiserror::Error;

/// Failures surfaced by caption discovery and aggregation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    #[error("player metadata not found on page")]
    MetadataNotFound,

    #[error("player metadata lists no caption tracks")]
    NoCaptionTracks,

    #[error("failed to fetch caption track: {0}")]
    TrackFetchFailed(String),

    #[error("no video id in page URL")]
    NoVideoId,

    #[error("no captions found for this video")]
    NoCaptionsFound,

    #[error("no caption track could be fetched")]
    NoCaptionsFetched,

    #[error("watch page unavailable: {0}")]
    PageUnavailable(String),
}
