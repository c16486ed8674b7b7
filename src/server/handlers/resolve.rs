use axum::{
    Json,
    extract::{Query, State},
};
use url::Url;

use crate::{
    Result,
    http::HeaderCodec,
    resolve::Resolution,
    server::{params::ResolveParams, state::AppState},
};

/// Handle GET /resolve requests.
pub async fn handle_resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<Resolution>> {
    tracing::info!("Resolve request: {}", params.url);

    // Parse base URL
    let base = params.base.as_deref().map(Url::parse).transpose()?;

    if state.signing_key.is_enabled() {
        let payload = signed_payload(&params, base.as_ref());
        state
            .signing_key
            .require(payload.as_bytes(), params.sig.as_deref())?;
    }

    // Decode and validate custom headers
    let headers = HeaderCodec::decode_optional(params.h.as_deref())?;
    let resolution = if headers.is_empty() {
        state.resolver.resolve(&params.url, base.as_ref()).await
    } else {
        state
            .resolver
            .with_extra_headers(&headers)
            .resolve(&params.url, base.as_ref())
            .await
    };
    tracing::debug!("Resolved {} -> {:?}", params.url, resolution);

    Ok(Json(resolution))
}

/// What a `/resolve` signature covers: the absolute URL the resolver will
/// fetch first, then the raw `h` parameter on its own line when present.
///
/// A URL that does not parse is signed as given; the resolver never fetches it.
fn signed_payload(params: &ResolveParams, base: Option<&Url>) -> String {
    let target = match Url::options().base_url(base).parse(&params.url) {
        Ok(url) => url.to_string(),
        Err(_) => params.url.clone(),
    };

    match params.h.as_deref() {
        Some(h) if !h.is_empty() => format!("{}\n{}", target, h),
        _ => target,
    }
}
