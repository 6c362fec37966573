use eyre::Result;
use log::debug;

use crate::fetch::Fetch;
use crate::page::HtmlPage;
use crate::{CaptionError, extract_video_id};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// HTTP client shared by page and caption requests. Cookies set by the watch
/// page are replayed to the captions endpoint.
pub fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .build()?;
    Ok(client)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Fetch the watch page for the video named by `url`
pub async fn load_page<F: Fetch>(fetcher: &F, url: &str) -> Result<HtmlPage, CaptionError> {
    let video_id = extract_video_id(url).ok_or(CaptionError::NoVideoId)?;
    let watch_url = watch_url(&video_id);
    debug!("Fetching watch page: {watch_url}");

    let resp = fetcher
        .fetch(&watch_url)
        .await
        .map_err(|e| CaptionError::PageUnavailable(e.to_string()))?;

    if !resp.is_success() {
        return Err(CaptionError::PageUnavailable(format!(
            "{watch_url} returned HTTP {}",
            resp.status
        )));
    }

    Ok(HtmlPage::new(watch_url, resp.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageContext;
    use crate::testing::{FakeFetcher, VIDEO_ID, watch_url as fake_watch_url};

    #[tokio::test]
    async fn test_load_page_normalizes_url() {
        let fetcher = FakeFetcher::new().with(fake_watch_url(), 200, "<html><script>var a = 1;</script></html>");

        let page = load_page(&fetcher, &format!("https://youtu.be/{VIDEO_ID}?t=42")).await.unwrap();
        assert_eq!(page.url(), fake_watch_url());
        assert_eq!(page.inline_scripts(), vec!["var a = 1;".to_string()]);
    }

    #[tokio::test]
    async fn test_load_page_errors() {
        let fetcher = FakeFetcher::new().with_failure(fake_watch_url(), "dns failure");

        assert_eq!(
            load_page(&fetcher, "https://example.com/").await.unwrap_err(),
            CaptionError::NoVideoId
        );
        assert!(matches!(
            load_page(&fetcher, VIDEO_ID).await.unwrap_err(),
            CaptionError::PageUnavailable(reason) if reason.contains("dns failure")
        ));
        assert!(matches!(
            load_page(&FakeFetcher::new(), VIDEO_ID).await.unwrap_err(),
            CaptionError::PageUnavailable(reason) if reason.contains("404")
        ));
    }
}
