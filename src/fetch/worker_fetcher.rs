//! Thread-backed `RangeFetcher` for callers that aren't already inside a Tokio
//! runtime: a dedicated worker thread owns a `reqwest::blocking::Client` and
//! drains a job queue, exactly mirroring the async fetcher's target-tracking
//! and status-classification behavior.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Url;

use super::{classify_response_status, FetchError, FetchRequest, RangeFetcher};

const READ_BUF_LEN: usize = 64 * 1024;

struct Job {
    request: FetchRequest,
    on_bytes: Box<dyn FnMut(&[u8]) -> bool + Send>,
    on_done: Box<dyn FnOnce(Result<(), FetchError>) + Send>,
}

pub struct WorkerThreadRangeFetcher {
    sender: mpsc::Sender<Job>,
    busy: Arc<AtomicBool>,
    _worker: thread::JoinHandle<()>,
}

impl Default for WorkerThreadRangeFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerThreadRangeFetcher {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("kinetoscope-fetch".into())
            .spawn(move || worker_loop(receiver))
            .expect("spawn fetch worker thread");
        Self {
            sender,
            busy: Arc::new(AtomicBool::new(false)),
            _worker: worker,
        }
    }
}

impl RangeFetcher for WorkerThreadRangeFetcher {
    fn fetch(
        &mut self,
        request: FetchRequest,
        on_bytes: Box<dyn FnMut(&[u8]) -> bool + Send>,
        on_done: Box<dyn FnOnce(Result<(), FetchError>) + Send>,
    ) {
        assert!(
            !self.busy.swap(true, Ordering::SeqCst),
            "kinetoscope: RangeFetcher::fetch called while a fetch is already in flight"
        );
        let busy = self.busy.clone();
        let wrapped_on_done: Box<dyn FnOnce(Result<(), FetchError>) + Send> = Box::new(move |result| {
            busy.store(false, Ordering::SeqCst);
            on_done(result);
        });
        self.sender
            .send(Job {
                request,
                on_bytes,
                on_done: wrapped_on_done,
            })
            .expect("fetch worker thread outlives the fetcher");
    }
}

fn worker_loop(receiver: mpsc::Receiver<Job>) {
    let mut client = build_client();
    let mut target: Option<(String, Option<u16>)> = None;

    for mut job in receiver {
        let outcome = run_job(&mut client, &mut target, &job.request, job.on_bytes.as_mut());
        (job.on_done)(outcome);
    }
}

fn build_client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("reqwest blocking client builds with no custom TLS config")
}

fn run_job(
    client: &mut Client,
    target: &mut Option<(String, Option<u16>)>,
    request: &FetchRequest,
    on_bytes: &mut (dyn FnMut(&[u8]) -> bool + Send),
) -> Result<(), FetchError> {
    let url = Url::parse(&request.url).map_err(|err| FetchError::Transport(err.to_string()))?;
    let new_target = (url.host_str().unwrap_or_default().to_string(), url.port());
    if target.as_ref() != Some(&new_target) {
        *client = build_client();
        *target = Some(new_target);
    }

    let requested_range = request.size.is_some();
    let range_header = request.range_header_value();
    let mut builder = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "Kinetoscope/1.0")
        .header(reqwest::header::CONNECTION, "keep-alive");
    if let Some(value) = &range_header {
        builder = builder.header(reqwest::header::RANGE, value);
    }
    tracing::debug!(url = %request.url, range = ?range_header, "sending range request");
    let mut response = builder.send().map_err(|err| FetchError::Transport(err.to_string()))?;
    tracing::debug!(url = %request.url, status = response.status().as_u16(), "received response headers");
    classify_response_status(requested_range, response.status().as_u16())?;

    let mut buf = [0u8; READ_BUF_LEN];
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        if n == 0 {
            return Ok(());
        }
        if !on_bytes(&buf[..n]) {
            return Err(FetchError::Cancelled);
        }
    }
}
