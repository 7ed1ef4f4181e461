//! HTTP range fetching against the download server's catalog and chunk
//! payloads.
//!
//! [`RangeFetcher`] is the seam between the streamer's command dispatch and the
//! network: [`reqwest_fetcher::ReqwestRangeFetcher`] drives it from an async
//! context with `reqwest::Client`, and [`worker_fetcher::WorkerThreadRangeFetcher`]
//! drives the same contract from a dedicated OS thread with the blocking
//! client, for callers that aren't already inside a Tokio runtime. Both share
//! [`classify_response_status`] so the range-support and redirect rules can't
//! drift between them.

pub mod reqwest_fetcher;
pub mod worker_fetcher;

pub use reqwest_fetcher::ReqwestRangeFetcher;
pub use worker_fetcher::WorkerThreadRangeFetcher;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    #[error("server does not support range requests (200 OK returned for a ranged GET)")]
    RangeUnsupported,

    #[error("redirects are not supported")]
    RedirectUnsupported,

    #[error("fetch cancelled")]
    Cancelled,
}

/// What to fetch: a URL, a starting byte offset, and `Some(len)` for a ranged
/// GET or `None` for a plain unranged GET of the whole resource.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub first_byte: u64,
    pub size: Option<u64>,
}

impl FetchRequest {
    pub fn range_header_value(&self) -> Option<String> {
        self.size.map(|size| {
            let last = self.first_byte + size.saturating_sub(1);
            format!("bytes={}-{}", self.first_byte, last)
        })
    }
}

/// A fetcher drives exactly one fetch at a time; `fetch` is fire-and-forget —
/// `on_bytes` is called as each chunk of the body arrives and `on_done` exactly
/// once, with the outcome. Calling `fetch` again before the previous one has
/// called `on_done` is a programming error the streamer must never commit.
pub trait RangeFetcher: Send {
    fn fetch(
        &mut self,
        request: FetchRequest,
        on_bytes: Box<dyn FnMut(&[u8]) -> bool + Send>,
        on_done: Box<dyn FnOnce(Result<(), FetchError>) + Send>,
    );
}

/// Shared status-code interpretation for both backends.
///
/// - A ranged request (`requested_range == true`) must see `206`; a `200`
///   means the server silently ignored `Range` and sent the whole resource.
/// - An unranged request must see `200`.
/// - Any `3xx` is rejected: this crate never follows redirects, since the
///   download server is expected to serve catalogs and chunks directly.
pub fn classify_response_status(requested_range: bool, status: u16) -> Result<(), FetchError> {
    if (300..400).contains(&status) {
        return Err(FetchError::RedirectUnsupported);
    }
    match (requested_range, status) {
        (true, 206) => Ok(()),
        (true, 200) => Err(FetchError::RangeUnsupported),
        (false, 200) => Ok(()),
        (_, status) => Err(FetchError::Http { status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranged_request_accepts_206() {
        assert_eq!(classify_response_status(true, 206), Ok(()));
    }

    #[test]
    fn ranged_request_rejects_200_as_range_unsupported() {
        assert_eq!(classify_response_status(true, 200), Err(FetchError::RangeUnsupported));
    }

    #[test]
    fn unranged_request_accepts_200() {
        assert_eq!(classify_response_status(false, 200), Ok(()));
    }

    #[test]
    fn redirects_are_always_rejected() {
        assert_eq!(classify_response_status(true, 302), Err(FetchError::RedirectUnsupported));
        assert_eq!(classify_response_status(false, 301), Err(FetchError::RedirectUnsupported));
    }

    #[test]
    fn other_statuses_are_reported_verbatim() {
        assert_eq!(classify_response_status(true, 404), Err(FetchError::Http { status: 404 }));
    }

    #[test]
    fn range_header_covers_the_requested_span() {
        let req = FetchRequest {
            url: "http://example".into(),
            first_byte: 100,
            size: Some(50),
        };
        assert_eq!(req.range_header_value().as_deref(), Some("bytes=100-149"));
    }

    #[test]
    fn unranged_request_has_no_range_header() {
        let req = FetchRequest {
            url: "http://example".into(),
            first_byte: 0,
            size: None,
        };
        assert_eq!(req.range_header_value(), None);
    }
}
