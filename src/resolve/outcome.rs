use serde::Serialize;
use url::Url;

/// What one hop turned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    /// 2xx with something other than a playlist: this is the stream.
    Terminal(Url),
    /// 3xx; the raw `Location` value, not yet joined to the hop URL.
    Redirect(String),
    /// 2xx playlist body.
    Manifest(String),
    /// Not http(s); nothing was sent.
    ProtocolSkipped(Url),
    Failed { url: Url, reason: FailureReason },
}

/// Why a chain gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    InvalidUrl,
    Transport,
    Timeout,
    UpstreamStatus(u16),
    MissingLocation,
    ManifestParse,
    RelativeResolution,
    HopLimit,
    Cycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// No resolution was needed.
    Unchanged,
    /// At least one hop was followed to a terminal URL.
    Resolved,
    /// Non-web scheme passed through as is.
    ProtocolSkipped,
    /// Gave up; the URL is the fallback.
    Failed(FailureReason),
}

/// Result of resolving a stream URL. `url` is always usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub url: String,
    pub status: ResolutionStatus,
    /// Network requests issued.
    pub hops: usize,
}

impl Resolution {
    pub fn new(url: impl Into<String>, status: ResolutionStatus, hops: usize) -> Self {
        Self {
            url: url.into(),
            status,
            hops,
        }
    }

    pub fn failed(url: impl Into<String>, reason: FailureReason, hops: usize) -> Self {
        Self::new(url, ResolutionStatus::Failed(reason), hops)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ResolutionStatus::Failed(_))
    }
}
