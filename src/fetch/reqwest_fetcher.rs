//! Async `RangeFetcher` built on `reqwest::Client`, driven from an already
//! running Tokio runtime (the streamer's dispatch loop).
//!
//! Connection reuse follows the target: as long as successive fetches hit the
//! same host and port, they share one `Client` (and its keep-alive pool).
//! Switching targets rebuilds the client, which drops the old pool's
//! connections rather than leaving them idle against a server we're done with.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use tokio::runtime::Handle;

use super::{classify_response_status, FetchError, FetchRequest, RangeFetcher};

pub struct ReqwestRangeFetcher {
    client: Client,
    target: Option<(String, Option<u16>)>,
    busy: Arc<AtomicBool>,
    handle: Handle,
}

impl Default for ReqwestRangeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestRangeFetcher {
    /// # Panics
    /// If called outside a running Tokio runtime.
    pub fn new() -> Self {
        Self {
            client: build_client(),
            target: None,
            busy: Arc::new(AtomicBool::new(false)),
            handle: Handle::current(),
        }
    }

    fn ensure_target(&mut self, url: &Url) {
        let target = (url.host_str().unwrap_or_default().to_string(), url.port());
        if self.target.as_ref() != Some(&target) {
            self.client = build_client();
            self.target = Some(target);
        }
    }
}

fn build_client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("reqwest client builds with no custom TLS config")
}

impl RangeFetcher for ReqwestRangeFetcher {
    fn fetch(
        &mut self,
        request: FetchRequest,
        mut on_bytes: Box<dyn FnMut(&[u8]) -> bool + Send>,
        on_done: Box<dyn FnOnce(Result<(), FetchError>) + Send>,
    ) {
        assert!(
            !self.busy.swap(true, Ordering::SeqCst),
            "kinetoscope: RangeFetcher::fetch called while a fetch is already in flight"
        );

        let url = match Url::parse(&request.url) {
            Ok(url) => url,
            Err(err) => {
                self.busy.store(false, Ordering::SeqCst);
                on_done(Err(FetchError::Transport(err.to_string())));
                return;
            }
        };
        self.ensure_target(&url);

        let client = self.client.clone();
        let busy = self.busy.clone();
        let requested_range = request.size.is_some();
        let range_header = request.range_header_value();

        self.handle.spawn(async move {
            let result = run_fetch(client, url, range_header, requested_range, &mut on_bytes).await;
            busy.store(false, Ordering::SeqCst);
            on_done(result);
        });
    }
}

async fn run_fetch(
    client: Client,
    url: Url,
    range_header: Option<String>,
    requested_range: bool,
    on_bytes: &mut (dyn FnMut(&[u8]) -> bool + Send),
) -> Result<(), FetchError> {
    let request_url = url.to_string();
    let mut builder = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "Kinetoscope/1.0")
        .header(reqwest::header::CONNECTION, "keep-alive");
    if let Some(value) = &range_header {
        builder = builder.header(reqwest::header::RANGE, value);
    }
    tracing::debug!(url = %request_url, range = ?range_header, "sending range request");
    let response = builder
        .send()
        .await
        .map_err(|err| FetchError::Transport(err.to_string()))?;

    tracing::debug!(url = %request_url, status = response.status().as_u16(), "received response headers");
    classify_response_status(requested_range, response.status().as_u16())?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|err| FetchError::Transport(err.to_string()))?;
        if !on_bytes(&bytes) {
            return Err(FetchError::Cancelled);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn constructs_inside_a_runtime() {
        let fetcher = ReqwestRangeFetcher::new();
        assert!(fetcher.target.is_none());
    }
}
