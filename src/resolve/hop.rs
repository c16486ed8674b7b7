use bytes::BytesMut;
use futures::StreamExt;
use reqwest::{
    Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION},
};
use url::Url;

use super::outcome::{FailureReason, HopOutcome};
use crate::{
    Error, Result,
    http::{HttpClient, RequestOptions},
};

/// Playlists larger than this are not playlists we want to parse.
const MAX_MANIFEST_BYTES: usize = 1024 * 1024;

/// Issues a single GET and classifies the response.
#[derive(Clone)]
pub struct HopResolver {
    client: HttpClient,
    user_agent: HeaderValue,
    extra_headers: HeaderMap,
}

impl HopResolver {
    pub fn new(client: HttpClient, user_agent: &str) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::InvalidHeaderEncoding(format!("user agent: {}", e)))?;
        Ok(Self {
            client,
            user_agent,
            extra_headers: HeaderMap::new(),
        })
    }

    /// Same resolver, also sending `headers` on every request.
    pub fn with_extra_headers(&self, headers: &HeaderMap) -> Self {
        Self {
            client: self.client.clone(),
            user_agent: self.user_agent.clone(),
            extra_headers: headers.clone(),
        }
    }

    pub async fn resolve_one_hop(&self, url: &Url) -> HopOutcome {
        if !matches!(url.scheme(), "http" | "https") {
            tracing::warn!(
                "Stream protocol {} cannot be resolved, keeping {}",
                url.scheme(),
                url
            );
            return HopOutcome::ProtocolSkipped(url.clone());
        }

        let opts = RequestOptions::get(url.clone())
            .with_user_agent(self.user_agent.clone())
            .with_headers(&self.extra_headers);

        let response = match self.client.send(&opts).await {
            Ok(response) => response,
            Err(Error::ProtocolUnsupported(_)) => return HopOutcome::ProtocolSkipped(url.clone()),
            Err(e) => {
                tracing::error!("Request to {} failed: {}", url, e);
                return HopOutcome::Failed {
                    url: url.clone(),
                    reason: transport_reason(&e),
                };
            }
        };

        let status = response.status();
        tracing::debug!("GET {} -> {}", url, status);

        // 2xx: either a playlist to look inside or the stream itself
        if status.is_success() {
            if !is_manifest(response.headers()) {
                return HopOutcome::Terminal(url.clone());
            }
            return match read_manifest(response).await {
                Ok(body) => HopOutcome::Manifest(body),
                Err(reason) => {
                    tracing::error!("Failed to read playlist body from {}: {:?}", url, reason);
                    HopOutcome::Failed {
                        url: url.clone(),
                        reason,
                    }
                }
            };
        }

        if status.is_redirection() {
            return match location(response.headers()) {
                Some(location) => HopOutcome::Redirect(location),
                None => {
                    tracing::error!("Redirect {} from {} without Location", status, url);
                    HopOutcome::Failed {
                        url: url.clone(),
                        reason: FailureReason::MissingLocation,
                    }
                }
            };
        }

        tracing::error!("Error while resolving stream url {}: status {}", url, status);
        HopOutcome::Failed {
            url: url.clone(),
            reason: FailureReason::UpstreamStatus(status.as_u16()),
        }
    }
}

/// Raw `Location` value. Servers do send unencoded UTF-8 here; `Url::join`
/// percent-encodes it later.
fn location(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(LOCATION)?;
    let location = String::from_utf8_lossy(raw.as_bytes()).trim().to_string();
    Some(location).filter(|l| !l.is_empty())
}

fn is_manifest(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("mpegurl"))
        .unwrap_or(false)
}

fn transport_reason(e: &Error) -> FailureReason {
    match e {
        Error::FetchTimeout(_) => FailureReason::Timeout,
        _ => FailureReason::Transport,
    }
}

async fn read_manifest(response: Response) -> std::result::Result<String, FailureReason> {
    let mut body = BytesMut::new();
    let mut chunks = response.bytes_stream();

    // Stream the body so a huge "playlist" is cut off early
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| transport_reason(&Error::from(e)))?;
        if body.len() + chunk.len() > MAX_MANIFEST_BYTES {
            return Err(FailureReason::ManifestParse);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
