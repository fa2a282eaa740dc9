//! Error taxonomy shared by the gateway, discovery, batch and registry services.
//!
//! Expected "nothing found" outcomes never surface as errors past the search
//! resolver; they are turned into `error` envelopes there.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed input caught before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream answered 4xx other than 404.
    #[error("bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    /// Upstream answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Upstream 5xx or network failure after the retry budget was spent.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The registry bundle no longer matches the extraction pattern.
    #[error("no rollup data found in registry bundle - extraction pattern may need updating")]
    NoRollupDataFound,

    /// Head-height query returned a missing or zero height.
    #[error("unable to discover latest block: {0}")]
    DiscoveryFailed(String),

    /// Upstream body was not the JSON shape we expected.
    #[error("malformed upstream response: {0}")]
    Decode(String),
}

impl ScanError {
    /// Map a non-success upstream status into the taxonomy.
    pub fn from_status(status: u16, what: &str) -> Self {
        match status {
            404 => ScanError::NotFound(what.to_string()),
            400..=499 => ScanError::BadRequest {
                status,
                message: what.to_string(),
            },
            _ => ScanError::UpstreamUnavailable(format!("http {status}: {what}")),
        }
    }

    /// 4xx outcomes are final; everything else may be retried.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScanError::NotFound(_) | ScanError::BadRequest { .. } | ScanError::InvalidArgument(_)
        )
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ScanError::Decode(e.to_string())
        } else {
            ScanError::UpstreamUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(e: serde_json::Error) -> Self {
        ScanError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
