use serde::Deserialize;

use super::model::EpgChannel;
use crate::{Result, http::HttpClient};

/// Provider dumps come either as a bare array or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum EpgDocument {
    Channels(Vec<EpgChannel>),
    Wrapped {
        #[serde(alias = "Channels")]
        channels: Vec<EpgChannel>,
    },
}

/// Parse an EPG JSON document.
pub fn parse_channels(json: &str) -> Result<Vec<EpgChannel>> {
    let document: EpgDocument = serde_json::from_str(json)?;
    Ok(match document {
        EpgDocument::Channels(channels) | EpgDocument::Wrapped { channels } => channels,
    })
}

/// Load EPG channels from an http(s) URL or a local file path.
pub async fn load_channels(source: &str, client: &HttpClient) -> Result<Vec<EpgChannel>> {
    let json = if source.starts_with("http://") || source.starts_with("https://") {
        client.fetch_text(source, None).await?
    } else {
        tokio::fs::read_to_string(source).await?
    };

    parse_channels(&json)
}
