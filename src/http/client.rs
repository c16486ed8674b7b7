use crate::{Error, Result};
use reqwest::{
    Client, Method, Response,
    header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT},
    redirect::Policy,
};
use std::time::Duration;
use url::Url;

/// Everything needed to issue one request. Built once per hop.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(url: Url, method: Method, headers: HeaderMap) -> Self {
        Self {
            url,
            method,
            headers,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(url, Method::GET, HeaderMap::new())
    }

    pub fn with_user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.headers.insert(USER_AGENT, user_agent);
        self
    }

    /// Add `headers`, replacing any already set under the same name.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }
}

/// Build a header map, rejecting names or values that cannot go on the wire.
pub fn header_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// HTTP client for talking to upstream IPTV servers.
///
/// Redirects are never followed automatically; callers see every 3xx.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Send a request and hand back the response unread, whatever its status.
    ///
    /// Non-web schemes are refused before anything goes on the wire.
    pub async fn send(&self, opts: &RequestOptions) -> Result<Response> {
        // reqwest would try other schemes and fail with a builder error
        if !matches!(opts.url.scheme(), "http" | "https") {
            return Err(Error::ProtocolUnsupported(opts.url.scheme().to_string()));
        }

        // Send request, the caller decides what a status means
        let response = self
            .client
            .request(opts.method.clone(), opts.url.clone())
            .headers(opts.headers.clone())
            .send()
            .await?;

        Ok(response)
    }

    /// Fetch a URL and buffer the body as text. Non-2xx statuses are errors.
    pub async fn fetch_text(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<String> {
        let mut opts = RequestOptions::get(Url::parse(url)?);
        if let Some(headers) = headers {
            opts = opts.with_headers(headers);
        }

        let response = self.send(&opts).await?;
        let status = response.status();

        // Check for errors
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        tracing::debug!("Finished fetching {} ({} bytes)", url, bytes.len());

        String::from_utf8(bytes.to_vec()).map_err(|e| Error::FetchFailed {
            url: url.to_string(),
            reason: format!("Invalid UTF-8: {}", e),
        })
    }
}
