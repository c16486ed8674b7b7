use serde::Deserialize;

/// Query parameters for `GET /resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    /// Nominal stream URL.
    pub url: String,

    /// Base for a relative `url`.
    #[serde(default)]
    pub base: Option<String>,

    /// Base64url-encoded JSON headers sent on every hop.
    #[serde(default)]
    pub h: Option<String>,

    /// Hex HMAC-SHA256 of the absolute URL (after applying `base`), followed
    /// by `\n` and `h` when headers are sent. Required when a key is set.
    #[serde(default)]
    pub sig: Option<String>,
}

/// Query parameters for `POST /xmltv`.
#[derive(Debug, Deserialize)]
pub struct XmltvParams {
    /// Comma separated extra hour shifts, e.g. `1,2`.
    #[serde(default)]
    pub shift: Option<String>,

    /// Hex HMAC-SHA256 of the request body.
    #[serde(default)]
    pub sig: Option<String>,
}
