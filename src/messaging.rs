//! Native messaging endpoint.
//!
//! The browser extension talks to this process over stdio: every message is a
//! 4-byte native-endian length followed by that many bytes of UTF-8 JSON.

use eyre::{Result, bail};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::fetch::Fetch;
use crate::{AggregateResult, CaptionError, Settings, transcript, youtube};

/// Largest request accepted from the browser
pub const MAX_INBOUND_BYTES: usize = 4 * 1024 * 1024;
/// Browsers reject host messages above 1 MiB
pub const MAX_OUTBOUND_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "getTranscript")]
    GetTranscript {
        /// URL of the tab the request concerns
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AggregateResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(result: AggregateResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Answer one request; failures become `{ success: false, error }`
pub async fn handle<F: Fetch>(request: &Request, fetcher: &F, settings: &Settings) -> Response {
    match request {
        Request::GetTranscript { url } => match transcript_for(url.as_deref(), fetcher, settings).await {
            Ok(result) => Response::success(result),
            Err(e) => {
                warn!("getTranscript failed: {e}");
                Response::failure(e.to_string())
            }
        },
    }
}

async fn transcript_for<F: Fetch>(
    url: Option<&str>,
    fetcher: &F,
    settings: &Settings,
) -> Result<AggregateResult, CaptionError> {
    let url = url.ok_or(CaptionError::NoVideoId)?;
    let page = youtube::load_page(fetcher, url).await?;
    transcript::get_best_transcript(&page, fetcher, settings).await
}

/// Serve requests until the browser closes the pipe
pub async fn serve<R, W, F>(mut reader: R, mut writer: W, fetcher: &F, settings: &Settings) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Fetch,
{
    info!("Native messaging host started");
    while let Some(bytes) = read_message(&mut reader).await? {
        let response = match serde_json::from_slice::<Request>(&bytes) {
            Ok(request) => {
                debug!("Request: {request:?}");
                handle(&request, fetcher, settings).await
            }
            Err(e) => {
                warn!("Undecodable request: {e}");
                Response::failure(format!("invalid request: {e}"))
            }
        };
        write_message(&mut writer, &response).await?;
    }
    info!("Browser closed the connection");
    Ok(())
}

/// Read one framed message; `None` on a clean EOF between messages
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_INBOUND_BYTES {
        bail!("incoming message of {len} bytes exceeds {MAX_INBOUND_BYTES}");
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Write one framed response, replacing it with an error if it is too large
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<()> {
    let mut body = serde_json::to_vec(response)?;
    if body.len() > MAX_OUTBOUND_BYTES {
        warn!("Response of {} bytes exceeds the messaging limit", body.len());
        body = serde_json::to_vec(&Response::failure(format!(
            "transcript too large for native messaging ({} bytes)",
            body.len()
        )))?;
    }

    writer.write_all(&(body.len() as u32).to_ne_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}
