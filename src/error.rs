use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to fetch URL: {url} - {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Fetch timeout for URL: {0}")]
    FetchTimeout(String),

    #[error("Upstream returned HTTP {status} for URL: {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Protocol not supported: {0}")]
    ProtocolUnsupported(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header encoding: {0}")]
    InvalidHeaderEncoding(String),

    #[error("Invalid or missing signature")]
    InvalidSignature,

    #[error("Invalid EPG data: {0}")]
    InvalidEpg(String),

    #[error("Failed to write XMLTV: {0}")]
    Xmltv(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: String,
}

impl Error {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FetchFailed { .. } => "FETCH_FAILED",
            Self::FetchTimeout(_) => "FETCH_TIMEOUT",
            Self::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            Self::ProtocolUnsupported(_) => "PROTOCOL_UNSUPPORTED",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::InvalidHeaderEncoding(_) => "INVALID_HEADER_ENCODING",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidEpg(_) => "INVALID_EPG",
            Self::Xmltv(_) => "XMLTV_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::FetchFailed { .. } | Self::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            Self::FetchTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InvalidUrl(_)
            | Self::ProtocolUnsupported(_)
            | Self::InvalidHeaderEncoding(_)
            | Self::InvalidEpg(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::Xmltv(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::FetchTimeout(e.url().map(|u| u.to_string()).unwrap_or_default())
        } else {
            Self::FetchFailed {
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                reason: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidEpg(e.to_string())
    }
}
