//! Minimal HTTP/1.1 server that answers with chains of redirects.
//!
//! `GET|HEAD /r/N` responds 302 to `/r/N-1`; `/r/0` responds 200. Anything
//! else is 404. Every request is counted.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct RedirectServerOptions {
    /// If false, HEAD returns 405 (servers that only answer GET).
    pub head_allowed: bool,
}

impl Default for RedirectServerOptions {
    fn default() -> Self {
        Self { head_allowed: true }
    }
}

pub struct RedirectServer {
    /// Base URL with trailing slash, e.g. "http://127.0.0.1:12345/".
    pub base: String,
    hits: Arc<AtomicUsize>,
}

impl RedirectServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn start() -> RedirectServer {
    start_with_options(RedirectServerOptions::default())
}

/// Starts the server on a background thread. It runs until the process exits.
pub fn start_with_options(opts: RedirectServerOptions) -> RedirectServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || handle(stream, opts));
        }
    });
    RedirectServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, opts: RedirectServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("");

    if method.eq_ignore_ascii_case("HEAD") && !opts.head_allowed {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }

    let hops = path.strip_prefix("/r/").and_then(|n| n.parse::<u32>().ok());
    let response = match hops {
        Some(0) => {
            let body = "ok";
            let body = if method.eq_ignore_ascii_case("HEAD") { "" } else { body };
            format!(
                "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
                body
            )
        }
        Some(n) => format!(
            "HTTP/1.1 302 Found\r\nLocation: /r/{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            n - 1
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
    };
    let _ = stream.write_all(response.as_bytes());
}
