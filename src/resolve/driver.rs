use futures::{StreamExt, stream};
use reqwest::header::HeaderMap;
use std::collections::HashSet;
use url::Url;

use super::{
    classifier::url_needs_resolution,
    hop::HopResolver,
    outcome::{FailureReason, HopOutcome, Resolution, ResolutionStatus},
};
use crate::{Result, config::ResolverConfig, epg::EpgChannel, http::HttpClient, m3u};

/// Follows redirects and nested playlists down to a terminal stream URL.
///
/// Resolution never fails: every error path falls back to a URL the caller
/// can still use, and the reason is reported in [`ResolutionStatus`].
#[derive(Clone)]
pub struct StreamResolver {
    hop: HopResolver,
    config: ResolverConfig,
}

impl StreamResolver {
    pub fn new(config: ResolverConfig) -> Result<Self> {
        let client = HttpClient::new(config.hop_timeout)?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: HttpClient, config: ResolverConfig) -> Result<Self> {
        let hop = HopResolver::new(client, &config.user_agent)?;
        Ok(Self { hop, config })
    }

    /// Same resolver, sending `headers` on every hop as well.
    pub fn with_extra_headers(&self, headers: &HeaderMap) -> Self {
        Self {
            hop: self.hop.with_extra_headers(headers),
            config: self.config.clone(),
        }
    }

    /// Resolve `url`, relative to `base` when given.
    pub async fn resolve(&self, url: &str, base: Option<&Url>) -> Resolution {
        let start = match Url::options().base_url(base).parse(url) {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!("Cannot parse stream url '{}': {}", url, e);
                return Resolution::failed(url, FailureReason::InvalidUrl, 0);
            }
        };

        let mut hops = 0;
        let result =
            tokio::time::timeout(self.config.total_timeout, self.walk(&start, &mut hops)).await;

        match result {
            Ok(resolution) => resolution,
            Err(_) => {
                tracing::warn!(
                    "Resolving {} exceeded {:?} after {} hops, using the original url",
                    start,
                    self.config.total_timeout,
                    hops
                );
                Resolution::failed(start, FailureReason::Timeout, hops)
            }
        }
    }

    /// Resolve `url` and keep only the URL.
    pub async fn resolve_url(&self, url: &str, base: Option<&Url>) -> String {
        self.resolve(url, base).await.url
    }

    /// Resolved stream URL of a channel, or `None` when it has none.
    pub async fn resolve_channel_stream_url(&self, channel: &EpgChannel) -> Option<String> {
        let stream_url = channel.stream_url.as_deref()?;
        Some(self.resolve_url(stream_url, None).await)
    }

    /// Resolve many URLs with at most `concurrency` chains in flight.
    /// Results come back in input order.
    pub async fn resolve_all<I>(&self, urls: I) -> Vec<Resolution>
    where
        I: IntoIterator<Item = String>,
    {
        stream::iter(urls)
            .map(|url| async move { self.resolve(&url, None).await })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }

    /// Fill each channel's `url` from its resolved `stream_url`.
    /// Channels without a stream URL are left untouched.
    pub async fn resolve_channels(&self, channels: &mut [EpgChannel]) {
        let pending: Vec<(usize, String)> = channels
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.stream_url.clone().map(|url| (i, url)))
            .collect();

        let (indices, urls): (Vec<usize>, Vec<String>) = pending.into_iter().unzip();
        let resolutions = self.resolve_all(urls).await;

        let failed = resolutions.iter().filter(|r| r.is_failed()).count();
        tracing::info!(
            "Resolved {} channel stream urls ({} fell back)",
            resolutions.len(),
            failed
        );

        for (i, resolution) in indices.into_iter().zip(resolutions) {
            channels[i].url = Some(resolution.url);
        }
    }

    async fn walk(&self, start: &Url, hops: &mut usize) -> Resolution {
        let mut current = start.clone();
        let mut visited = HashSet::new();

        loop {
            if !url_needs_resolution(&current) {
                tracing::debug!("{} does not need resolution", current);
                let status = if *hops == 0 {
                    ResolutionStatus::Unchanged
                } else {
                    ResolutionStatus::Resolved
                };
                return Resolution::new(current, status, *hops);
            }

            if *hops >= self.config.max_hops {
                tracing::warn!(
                    "Giving up on {} after {} hops, using the original url",
                    start,
                    hops
                );
                return Resolution::failed(start.as_str(), FailureReason::HopLimit, *hops);
            }

            if !visited.insert(current.clone()) {
                tracing::warn!("Resolution of {} loops at {}", start, current);
                return Resolution::failed(start.as_str(), FailureReason::Cycle, *hops);
            }

            let outcome = self.hop.resolve_one_hop(&current).await;
            // Only requests count as hops, a skipped scheme sends nothing
            if !matches!(outcome, HopOutcome::ProtocolSkipped(_)) {
                *hops += 1;
            }

            let next = match outcome {
                HopOutcome::ProtocolSkipped(url) => {
                    return Resolution::new(url, ResolutionStatus::ProtocolSkipped, *hops);
                }
                HopOutcome::Terminal(url) => {
                    return Resolution::new(url, ResolutionStatus::Resolved, *hops);
                }
                HopOutcome::Failed { url, reason } => {
                    return Resolution::failed(url, reason, *hops);
                }
                HopOutcome::Redirect(location) => {
                    tracing::debug!("{} redirects to {}", current, location);
                    location
                }
                HopOutcome::Manifest(body) => match m3u::first_entry(&body) {
                    Ok(entry) => {
                        tracing::debug!("{} wraps {}", current, entry.stream_url);
                        entry.stream_url
                    }
                    Err(e) => {
                        tracing::error!("Cannot parse playlist from {}: {}", current, e);
                        return Resolution::failed(current, FailureReason::ManifestParse, *hops);
                    }
                },
            };

            // Successors are relative to the hop that produced them
            current = match current.join(&next) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("Cannot resolve url '{}' based on '{}': {}", next, current, e);
                    return Resolution::failed(current, FailureReason::RelativeResolution, *hops);
                }
            };
        }
    }
}
