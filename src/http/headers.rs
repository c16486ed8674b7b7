use crate::{Error, Result, http::header_map};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;

/// Extra request headers carried in a query parameter as base64url JSON,
/// e.g. a `Referer` some IPTV portals insist on.
///
/// Decoding validates every name and value, so a bad header is rejected
/// when the request comes in rather than on the first hop.
pub struct HeaderCodec;

impl HeaderCodec {
    pub fn decode(encoded: &str) -> Result<HeaderMap> {
        // Some clients keep the padding, base64url without it is canonical
        let json = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;

        let pairs: BTreeMap<String, String> = serde_json::from_slice(&json)
            .map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;

        header_map(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Encode `headers`; values that are not visible ASCII are refused.
    pub fn encode(headers: &HeaderMap) -> Result<String> {
        let mut pairs = BTreeMap::new();
        for (name, value) in headers {
            let value = value
                .to_str()
                .map_err(|e| Error::InvalidHeaderEncoding(format!("{}: {}", name, e)))?;
            pairs.insert(name.as_str(), value);
        }

        let json =
            serde_json::to_vec(&pairs).map_err(|e| Error::InvalidHeaderEncoding(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Missing or empty parameter means no extra headers.
    pub fn decode_optional(encoded: Option<&str>) -> Result<HeaderMap> {
        match encoded {
            Some(s) if !s.is_empty() => Self::decode(s),
            _ => Ok(HeaderMap::new()),
        }
    }
}
