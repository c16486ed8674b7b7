use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    Error, Result,
    config::parse_shifts,
    epg::source::parse_channels,
    server::{params::XmltvParams, state::AppState},
};

/// Handle POST /xmltv requests: EPG JSON in, XMLTV out.
pub async fn handle_xmltv(
    State(state): State<AppState>,
    Query(params): Query<XmltvParams>,
    body: Bytes,
) -> Result<Response> {
    // Signature is over the raw bytes, before any parsing
    state.signing_key.require(&body, params.sig.as_deref())?;

    let json = std::str::from_utf8(&body).map_err(|e| Error::InvalidEpg(e.to_string()))?;
    let mut channels = parse_channels(json)?;
    tracing::info!("XMLTV request for {} channels", channels.len());

    state.resolver.resolve_channels(&mut channels).await;

    // Query shifts replace the configured ones
    let shifts = match params.shift.as_deref() {
        Some(shift) => parse_shifts(shift),
        None => state.xmltv.config().shifts.clone(),
    };
    let xml = state.xmltv.write_with_shifts(&channels, &shifts)?;

    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        xml,
    )
        .into_response())
}
