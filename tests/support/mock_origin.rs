//! A bespoke, loopback-only HTTP/1.1 origin server for the streamer
//! integration tests.
//!
//! Hand-rolled rather than pulled from a mocking crate: request parsing is the
//! bare minimum the fetchers actually exercise (request line plus an optional
//! `Range` header), and routes can be registered with an artificial startup
//! delay to stand in for a slow origin (used by the underflow and
//! cancellation scenarios).

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ObservedRequest {
    pub path: String,
    pub range: Option<Range<u64>>,
}

#[derive(Clone)]
struct Route {
    body: Arc<Vec<u8>>,
    /// Wait before writing the response at all, simulating a slow origin.
    header_delay: Duration,
    /// Split the body into pieces this large, sleeping `piece_delay` between
    /// each — so a test can cancel mid-transfer instead of only before or
    /// after it. 0 means "write the whole body in ordinary 4 KiB chunks with
    /// no pacing".
    piece_len: usize,
    piece_delay: Duration,
}

pub struct MockOriginBuilder {
    routes: HashMap<String, Route>,
}

impl MockOriginBuilder {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Serve `body` at `path` (no leading slash) with no artificial delay.
    pub fn route(mut self, path: impl Into<String>, body: Vec<u8>) -> Self {
        self.routes.insert(
            path.into(),
            Route {
                body: Arc::new(body),
                header_delay: Duration::ZERO,
                piece_len: 0,
                piece_delay: Duration::ZERO,
            },
        );
        self
    }

    /// Serve `body` at `path`, but wait `delay` before writing anything —
    /// simulating a slow origin for the underflow scenario.
    pub fn slow_route(mut self, path: impl Into<String>, body: Vec<u8>, delay: Duration) -> Self {
        self.routes.insert(
            path.into(),
            Route {
                body: Arc::new(body),
                header_delay: delay,
                piece_len: 0,
                piece_delay: Duration::ZERO,
            },
        );
        self
    }

    /// Serve `body` at `path` in `piece_len`-byte pieces, pausing
    /// `piece_delay` between each — gives a test a window to cancel a fetch
    /// mid-transfer, rather than only before or after it runs.
    pub fn drip_route(mut self, path: impl Into<String>, body: Vec<u8>, piece_len: usize, piece_delay: Duration) -> Self {
        self.routes.insert(
            path.into(),
            Route {
                body: Arc::new(body),
                header_delay: Duration::ZERO,
                piece_len,
                piece_delay,
            },
        );
        self
    }

    pub fn start(self) -> MockOrigin {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        listener.set_nonblocking(true).expect("set nonblocking");
        let addr = listener.local_addr().expect("local addr");

        let shutdown = Arc::new(AtomicBool::new(false));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = self.routes;

        let thread_shutdown = shutdown.clone();
        let thread_requests = requests.clone();
        let handle = std::thread::spawn(move || {
            while !thread_shutdown.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let routes = routes.clone();
                        let requests = thread_requests.clone();
                        let shutdown = thread_shutdown.clone();
                        std::thread::spawn(move || serve_one(stream, &routes, &requests, &shutdown));
                    }
                    Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        MockOrigin {
            addr,
            shutdown,
            requests,
            handle: Some(handle),
        }
    }
}

pub struct MockOrigin {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<ObservedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockOrigin {
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }

    pub fn requests(&self) -> Vec<ObservedRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }
}

impl Drop for MockOrigin {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_one(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    requests: &Arc<Mutex<Vec<ObservedRequest>>>,
    shutdown: &Arc<AtomicBool>,
) {
    stream.set_nodelay(true).ok();
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .trim_start_matches('/')
        .to_string();

    let mut range = None;
    loop {
        let mut header_line = String::new();
        if reader.read_line(&mut header_line).unwrap_or(0) == 0 {
            break;
        }
        let trimmed = header_line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        let lower = trimmed.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("range: bytes=") {
            range = parse_range(value);
        }
    }

    requests.lock().expect("requests mutex poisoned").push(ObservedRequest {
        path: path.clone(),
        range: range.clone(),
    });

    let Some(route) = routes.get(&path) else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    };

    if !route.header_delay.is_zero() {
        let step = Duration::from_millis(20);
        let mut waited = Duration::ZERO;
        while waited < route.header_delay {
            if shutdown.load(Ordering::SeqCst) {
                return;
            }
            std::thread::sleep(step);
            waited += step;
        }
    }

    let body_len = route.body.len() as u64;
    let (status, start, slice) = match &range {
        Some(r) if r.start >= body_len => ("416 Range Not Satisfiable", 0u64, &route.body[0..0]),
        Some(r) => {
            let end = r.end.min(body_len) as usize;
            ("206 Partial Content", r.start, &route.body[r.start as usize..end])
        }
        None => ("200 OK", 0u64, route.body.as_slice()),
    };

    let mut response_head = format!("HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n", slice.len());
    if range.is_some() {
        let last = start + slice.len().saturating_sub(1) as u64;
        response_head.push_str(&format!("Content-Range: bytes {start}-{last}/{body_len}\r\n"));
    }
    response_head.push_str("\r\n");

    if stream.write_all(response_head.as_bytes()).is_err() {
        return;
    }

    // Written piecewise so a client that drops the connection mid-transfer
    // (STOP_VIDEO cancellation) is observed here, rather than masked by one
    // large write syscall succeeding atomically.
    let piece_len = if route.piece_len == 0 { 4096 } else { route.piece_len };
    for piece in slice.chunks(piece_len) {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        if stream.write_all(piece).is_err() {
            return;
        }
        if stream.flush().is_err() {
            return;
        }
        if !route.piece_delay.is_zero() {
            std::thread::sleep(route.piece_delay);
        }
    }
}

fn parse_range(value: &str) -> Option<Range<u64>> {
    let (start, end) = value.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    if end.trim().is_empty() {
        return Some(start..u64::MAX);
    }
    let end: u64 = end.trim().parse().ok()?;
    Some(start..end + 1)
}
