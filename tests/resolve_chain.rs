//! Integration test: resolve stream URLs against a local upstream that
//! redirects, wraps streams in playlists, fails and stalls.

mod common;

use axum::{
    Router,
    extract::Path,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use common::upstream::{Upstream, closed_port_url};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tvgrab::{
    config::ResolverConfig,
    epg::EpgChannel,
    http::header_map,
    resolve::{FailureReason, ResolutionStatus, StreamResolver},
};

const HLS: &str = "application/vnd.apple.mpegURL";

fn resolver() -> StreamResolver {
    StreamResolver::new(ResolverConfig::default()).unwrap()
}

fn resolver_with(config: ResolverConfig) -> StreamResolver {
    StreamResolver::new(config).unwrap()
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn media() -> Response {
    ([(header::CONTENT_TYPE, "video/mp2t")], "not really a transport stream").into_response()
}

/// Number in a `<n>.m3u8` path segment.
fn hop_number(file: &str) -> usize {
    file.trim_end_matches(".m3u8").parse().unwrap_or(0)
}

#[tokio::test]
async fn terminal_extension_is_returned_without_requests() {
    let upstream = Upstream::bind().await;
    let url = upstream.url("/vod/movie.mp4");
    let hits = upstream.serve(Router::new());

    let resolution = resolver().resolve(&url, None).await;

    assert_eq!(resolution.url, url);
    assert_eq!(resolution.status, ResolutionStatus::Unchanged);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn redirect_is_followed_to_terminal_response() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/a.m3u8");
    let target = upstream.url("/b.html");

    let router = Router::new()
        .route("/a.m3u8", get(|| async { redirect("/b.html") }))
        .route("/b.html", get(|| async { media() }));
    let hits = upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, target);
    assert_eq!(resolution.status, ResolutionStatus::Resolved);
    assert_eq!(resolution.hops, 2);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn redirect_to_media_stops_without_fetching_it() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/live/rai1.html");

    let router = Router::new().route(
        "/live/rai1.html",
        get(|| async { redirect("http://cdn.invalid/rai1/stream.ts") }),
    );
    let hits = upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, "http://cdn.invalid/rai1/stream.ts");
    assert_eq!(resolution.status, ResolutionStatus::Resolved);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn manifest_stream_url_is_followed() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/c/index.m3u8");
    let stream = upstream.url("/c/stream.mp4");

    let body = format!("#EXTM3U\n#EXTINF:-1 tvg-id=\"c\",Channel C\n{}\n", stream);
    let router = Router::new().route(
        "/c/index.m3u8",
        get(move || {
            let body = body.clone();
            async move { ([(header::CONTENT_TYPE, HLS)], body) }
        }),
    );
    let hits = upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, stream);
    assert_eq!(resolution.status, ResolutionStatus::Resolved);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn successors_resolve_against_the_hop_that_produced_them() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/portal/watch.html");

    let router = Router::new()
        .route(
            "/portal/watch.html",
            get(|| async { redirect("../live/rai2/list.m3u8") }),
        )
        .route(
            "/live/rai2/list.m3u8",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/x-mpegurl")],
                    "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\nhd/chunks.m3u8\n",
                )
            }),
        )
        .route(
            "/live/rai2/hd/chunks.m3u8",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, HLS)],
                    "#EXTM3U\n#EXTINF:6.0,\nseg-001.ts\n",
                )
            }),
        );
    let hits = upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, upstream_url_for(&start, "/live/rai2/hd/seg-001.ts"));
    assert_eq!(resolution.hops, 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

fn upstream_url_for(start: &str, path: &str) -> String {
    let mut url = url::Url::parse(start).unwrap();
    url.set_path(path);
    url.to_string()
}

#[tokio::test]
async fn non_ascii_location_is_percent_encoded() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/canale.m3u8");

    let router = Router::new().route(
        "/canale.m3u8",
        get(|| async {
            let location = HeaderValue::from_bytes("/diretta/perù.ts".as_bytes()).unwrap();
            (StatusCode::FOUND, [(header::LOCATION, location)])
        }),
    );
    upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.status, ResolutionStatus::Resolved);
    assert_eq!(
        resolution.url,
        upstream_url_for(&start, "/diretta/per%C3%B9.ts")
    );
}

#[tokio::test]
async fn channel_stream_url_is_resolved() {
    let upstream = Upstream::bind().await;
    let target = upstream.url("/rai1/live.ts");

    let router = Router::new().route("/rai1/index.m3u8", get(|| async { redirect("live.ts") }));
    let hits = upstream.serve(router);

    let channel = EpgChannel {
        id_epg: "rai1".to_string(),
        name: "Rai 1".to_string(),
        stream_url: Some(upstream_url_for(&target, "/rai1/index.m3u8")),
        ..EpgChannel::default()
    };

    let resolved = resolver().resolve_channel_stream_url(&channel).await;

    assert_eq!(resolved, Some(target));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unparsable_manifest_falls_back_to_hop_url() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/broken.m3u8");

    let router = Router::new().route(
        "/broken.m3u8",
        get(|| async { ([(header::CONTENT_TYPE, HLS)], "<html>maintenance</html>") }),
    );
    upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::ManifestParse)
    );
}

#[tokio::test]
async fn connection_refused_falls_back_to_input() {
    let start = closed_port_url("/live/rai3.m3u8");

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::Transport)
    );
}

#[tokio::test]
async fn error_status_falls_back_to_the_failing_hop() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/a.html");
    let gone = upstream.url("/gone.m3u8");

    let router = Router::new().route("/a.html", get(|| async { redirect("/gone.m3u8") }));
    upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, gone);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::UpstreamStatus(404))
    );
}

#[tokio::test]
async fn redirect_without_location_falls_back() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/moved.m3u8");

    let router = Router::new().route("/moved.m3u8", get(|| async { StatusCode::FOUND }));
    upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::MissingLocation)
    );
}

#[tokio::test]
async fn non_web_scheme_passes_through_untouched() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/a.m3u8");

    let router = Router::new().route(
        "/a.m3u8",
        get(|| async { redirect("rtsp://camera.invalid/live/list.m3u8") }),
    );
    let hits = upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;
    assert_eq!(resolution.url, "rtsp://camera.invalid/live/list.m3u8");
    assert_eq!(resolution.status, ResolutionStatus::ProtocolSkipped);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let direct = resolver().resolve("rtmp://host/stream", None).await;
    assert_eq!(direct.url, "rtmp://host/stream");
    assert_eq!(direct.hops, 0);
}

#[tokio::test]
async fn requests_identify_as_vlc() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/gated.m3u8");

    let router = Router::new().route(
        "/gated.m3u8",
        get(|headers: HeaderMap| async move {
            match headers.get(header::USER_AGENT) {
                Some(ua) if ua == "VLC" => media(),
                _ => StatusCode::FORBIDDEN.into_response(),
            }
        }),
    );
    upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.status, ResolutionStatus::Resolved);
}

#[tokio::test]
async fn extra_headers_are_sent_on_every_hop() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/portal.html");

    let check = |headers: &HeaderMap| {
        headers.get(header::REFERER).map(|v| v == "http://portal.example.com/") == Some(true)
    };
    let router = Router::new()
        .route(
            "/portal.html",
            get(move |headers: HeaderMap| async move {
                if check(&headers) {
                    redirect("/live.m3u8")
                } else {
                    StatusCode::FORBIDDEN.into_response()
                }
            }),
        )
        .route(
            "/live.m3u8",
            get(move |headers: HeaderMap| async move {
                if check(&headers) {
                    media()
                } else {
                    StatusCode::FORBIDDEN.into_response()
                }
            }),
        );
    upstream.serve(router);

    let extra = header_map([("Referer", "http://portal.example.com/")]).unwrap();
    let resolution = resolver()
        .with_extra_headers(&extra)
        .resolve(&start, None)
        .await;

    assert_eq!(resolution.status, ResolutionStatus::Resolved);
    assert!(resolution.url.ends_with("/live.m3u8"));
}

#[tokio::test]
async fn redirect_loop_is_detected() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/ping.m3u8");

    let router = Router::new()
        .route("/ping.m3u8", get(|| async { redirect("/pong.m3u8") }))
        .route("/pong.m3u8", get(|| async { redirect("/ping.m3u8") }));
    let hits = upstream.serve(router);

    let resolution = resolver().resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::Cycle)
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn hop_limit_stops_endless_chains() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/hop/0.m3u8");

    let router = Router::new().route(
        "/hop/{file}",
        get(|Path(file): Path<String>| async move {
            redirect(&format!("/hop/{}.m3u8", hop_number(&file) + 1))
        }),
    );
    let hits = upstream.serve(router);

    let config = ResolverConfig {
        max_hops: 3,
        ..ResolverConfig::default()
    };
    let resolution = resolver_with(config).resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::HopLimit)
    );
    assert_eq!(resolution.hops, 3);
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn stalled_hop_times_out() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/stall.m3u8");

    let router = Router::new().route(
        "/stall.m3u8",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            media()
        }),
    );
    upstream.serve(router);

    let config = ResolverConfig {
        hop_timeout: Duration::from_millis(200),
        ..ResolverConfig::default()
    };
    let resolution = resolver_with(config).resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::Timeout)
    );
}

#[tokio::test]
async fn slow_chain_exceeds_total_budget() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/slow/0.m3u8");

    let router = Router::new().route(
        "/slow/{file}",
        get(|Path(file): Path<String>| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            redirect(&format!("/slow/{}.m3u8", hop_number(&file) + 1))
        }),
    );
    upstream.serve(router);

    let config = ResolverConfig {
        max_hops: 1000,
        total_timeout: Duration::from_millis(450),
        ..ResolverConfig::default()
    };
    let resolution = resolver_with(config).resolve(&start, None).await;

    assert_eq!(resolution.url, start);
    assert_eq!(
        resolution.status,
        ResolutionStatus::Failed(FailureReason::Timeout)
    );
    assert!(resolution.hops >= 1);
}

#[tokio::test]
async fn resolved_url_is_a_fixed_point() {
    let upstream = Upstream::bind().await;
    let start = upstream.url("/a.m3u8");

    let router = Router::new().route("/a.m3u8", get(|| async { redirect("/feed/stream.ts") }));
    let hits = upstream.serve(router);

    let resolver = resolver();
    let first = resolver.resolve(&start, None).await;
    let second = resolver.resolve(&first.url, None).await;

    assert_eq!(second.url, first.url);
    assert_eq!(second.status, ResolutionStatus::Unchanged);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resolve_all_bounds_concurrency_and_keeps_order() {
    let upstream = Upstream::bind().await;
    let urls: Vec<String> = (0..6)
        .map(|i| upstream.url(&format!("/ch/{}.m3u8", i)))
        .collect();

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (in_flight_h, peak_h) = (in_flight.clone(), peak.clone());

    let router = Router::new().route(
        "/ch/{file}",
        get(move |Path(file): Path<String>| {
            let (in_flight, peak) = (in_flight_h.clone(), peak_h.clone());
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                redirect(&format!("/media/{}.ts", hop_number(&file)))
            }
        }),
    );
    upstream.serve(router);

    let config = ResolverConfig {
        concurrency: 2,
        ..ResolverConfig::default()
    };
    let resolutions = resolver_with(config).resolve_all(urls.clone()).await;

    assert_eq!(resolutions.len(), 6);
    for (i, resolution) in resolutions.iter().enumerate() {
        assert!(
            resolution.url.ends_with(&format!("/media/{}.ts", i)),
            "{} out of order",
            resolution.url
        );
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}
