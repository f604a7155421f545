//! Event sources that feed URL-open requests into the dispatch queue.

use std::io::BufRead;
use std::thread;

use crate::dispatch::DispatchHandle;
use crate::event::IncomingUrlEvent;

/// Something that delivers `(url, pid, opener?)` events into the queue.
///
/// `start` must not block; long-lived sources run on their own thread and
/// stop once the queue is closed or their input ends.
pub trait EventSource {
    fn start(self: Box<Self>, handle: DispatchHandle) -> Option<thread::JoinHandle<()>>;
}

/// URLs passed on the command line (how most desktops hand a URL to a handler).
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    urls: Vec<String>,
}

impl ArgsSource {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

impl EventSource for ArgsSource {
    fn start(self: Box<Self>, handle: DispatchHandle) -> Option<thread::JoinHandle<()>> {
        for url in self.urls {
            if let Err(e) = handle.submit(IncomingUrlEvent::new(url, 0, None)) {
                tracing::warn!("dropping command-line URL: {}", e);
            }
        }
        None
    }
}

/// Line-delimited events on stdin: bare URLs or JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl EventSource for StdinSource {
    fn start(self: Box<Self>, handle: DispatchHandle) -> Option<thread::JoinHandle<()>> {
        let join = thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::warn!("stdin read failed: {}", e);
                        break;
                    }
                };
                match IncomingUrlEvent::from_line(&line) {
                    Ok(Some(event)) => {
                        if let Err(e) = handle.submit(event) {
                            tracing::debug!("stdin source stopping: {}", e);
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("ignoring malformed event line: {}", e),
                }
            }
        });
        Some(join)
    }
}
