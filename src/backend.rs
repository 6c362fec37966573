use eyre::{Result, bail};
use log::debug;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const NO_TRANSCRIPT: &str = "No transcript found.";

/// Ask the backend service to turn a video's transcript into a post
pub async fn fetch_post(client: &reqwest::Client, base_url: &str, video_id: &str) -> Result<String> {
    let url = format!("{}/transcript/{video_id}", base_url.trim_end_matches('/'));
    debug!("Requesting post from backend: {url}");

    let resp = client.get(&url).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("backend returned {status}: {}", error_detail(&body));
    }

    let json: serde_json::Value = resp.json().await?;
    Ok(extract_post(&json))
}

fn extract_post(json: &serde_json::Value) -> String {
    json.get("linkedin_post")
        .and_then(|p| p.as_str())
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(NO_TRANSCRIPT)
        .to_string()
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("detail")?.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_post() {
        let json = serde_json::json!({
            "videoId": "dQw4w9WgXcQ",
            "transcript": "never gonna\n",
            "linkedin_post": "Big lessons from a classic."
        });
        assert_eq!(extract_post(&json), "Big lessons from a classic.");
    }

    #[test]
    fn test_extract_post_missing() {
        assert_eq!(extract_post(&serde_json::json!({"videoId": "x"})), NO_TRANSCRIPT);
        assert_eq!(extract_post(&serde_json::json!({"linkedin_post": null})), NO_TRANSCRIPT);
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(r#"{"detail": "Subtitles are disabled"}"#), "Subtitles are disabled");
        assert_eq!(error_detail("Internal Server Error\n"), "Internal Server Error");
    }
}
