//! Minimal HTTP/1.1 GET server for integration tests.
//!
//! Serves a fixed set of routes; anything else is a 404. Routes can be
//! throttled (body written in chunks with a pause between them) and can omit
//! Content-Length. The server counts requests per path and tracks how many
//! responses are in flight at once, with the peak.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Write the body in pieces of this size...
    pub chunk: usize,
    /// ...sleeping this long before each piece.
    pub delay: Duration,
    pub content_length: bool,
    pub location: Option<String>,
}

impl Route {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            chunk: usize::MAX,
            delay: Duration::ZERO,
            content_length: true,
            location: None,
        }
    }

    /// Body sent in `chunk`-byte pieces, `delay` apart.
    pub fn slow(body: Vec<u8>, chunk: usize, delay: Duration) -> Self {
        Self {
            chunk: chunk.max(1),
            delay,
            ..Self::ok(body)
        }
    }

    pub fn status(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            ..Self::ok(body.to_vec())
        }
    }

    /// `302 Found` pointing at `location` (a path on this server).
    pub fn redirect(location: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            ..Self::status(302, b"")
        }
    }

    /// Close-delimited body without a Content-Length header.
    pub fn without_length(mut self) -> Self {
        self.content_length = false;
        self
    }
}

#[derive(Debug, Default)]
struct Stats {
    active: AtomicUsize,
    peak: AtomicUsize,
    hits: Mutex<HashMap<String, usize>>,
}

/// Decrements the active gauge when a response ends, however it ends.
struct ActiveGuard(Arc<Stats>);

impl ActiveGuard {
    fn enter(stats: &Arc<Stats>) -> Self {
        let now = stats.active.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard(Arc::clone(stats))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FileServer {
    base: String,
    stats: Arc<Stats>,
}

impl FileServer {
    /// Start serving `routes` (path -> route) on an ephemeral port. The
    /// server runs until the process exits.
    pub fn start<I, P>(routes: I) -> Self
    where
        I: IntoIterator<Item = (P, Route)>,
        P: Into<String>,
    {
        let routes: HashMap<String, Route> =
            routes.into_iter().map(|(p, r)| (p.into(), r)).collect();
        let routes = Arc::new(routes);
        let stats = Arc::new(Stats::default());
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();

        let server_stats = Arc::clone(&stats);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let stats = Arc::clone(&server_stats);
                thread::spawn(move || handle(stream, &routes, &stats));
            }
        });

        Self {
            base: format!("http://127.0.0.1:{}", port),
            stats,
        }
    }

    /// Absolute URL for `path` (which starts with '/').
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Most responses ever in flight at the same time.
    pub fn peak(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.stats.active.load(Ordering::SeqCst)
    }

    /// Requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.stats
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

fn read_request_path(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    let mut parts = head.lines().next()?.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    if !method.eq_ignore_ascii_case("GET") {
        return None;
    }
    Some(path.to_string())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, stats: &Arc<Stats>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(path) = read_request_path(&mut stream) else {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        return;
    };
    *stats.hits.lock().unwrap().entry(path.clone()).or_default() += 1;
    let _active = ActiveGuard::enter(stats);

    let not_found = Route::status(404, b"not found");
    let route = routes.get(&path).unwrap_or(&not_found);

    let mut head = format!(
        "HTTP/1.1 {} {}\r\nConnection: close\r\n",
        route.status,
        reason(route.status)
    );
    if let Some(location) = &route.location {
        head.push_str(&format!("Location: {}\r\n", location));
    }
    if route.content_length {
        head.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    head.push_str("\r\n");
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }

    for piece in route.body.chunks(route.chunk) {
        if !route.delay.is_zero() {
            thread::sleep(route.delay);
        }
        if stream.write_all(piece).and_then(|_| stream.flush()).is_err() {
            return;
        }
    }
    let _ = stream.shutdown(std::net::Shutdown::Write);
}
