//! DispatchLoop: serializes URL events through the pipeline one at a time.
//!
//! Producers (command-line args, stdin, OS callbacks) push into an unbounded
//! queue through a cloneable `DispatchHandle`. A single worker drains the
//! queue in FIFO order and runs each event on a blocking thread, awaiting it
//! before taking the next one. If the worker stays idle for the configured
//! timeout the loop returns so the process can exit.

mod pipeline;

pub use pipeline::{DaemonContext, Pipeline};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::browser::LaunchCommand;
use crate::error::DispatchError;
use crate::event::IncomingUrlEvent;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("refusing event with an empty URL")]
    EmptyUrl,
    #[error("dispatch queue is closed")]
    Closed,
}

/// Producer side of the event queue. Never blocks.
#[derive(Debug, Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<IncomingUrlEvent>,
}

impl DispatchHandle {
    pub fn submit(&self, event: IncomingUrlEvent) -> Result<(), SubmitError> {
        if event.url.trim().is_empty() {
            return Err(SubmitError::EmptyUrl);
        }
        self.tx.send(event).map_err(|_| SubmitError::Closed)
    }
}

/// Consumer side of the event queue.
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<IncomingUrlEvent>,
}

impl EventQueue {
    /// Next event, or `None` once every handle is dropped and the queue is empty.
    pub async fn recv(&mut self) -> Option<IncomingUrlEvent> {
        self.rx.recv().await
    }
}

pub fn channel() -> (DispatchHandle, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DispatchHandle { tx }, EventQueue { rx })
}

/// Runs one event to completion. Called on a blocking worker thread.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: IncomingUrlEvent) -> Result<LaunchCommand, DispatchError>;
}

/// Why the loop stopped without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// No event arrived within the idle timeout.
    IdleTimeout,
    /// All producers went away and the queue drained.
    SourceClosed,
}

pub struct DispatchLoop<H: EventHandler + ?Sized> {
    queue: EventQueue,
    handler: Arc<H>,
    idle_timeout: Duration,
}

impl<H: EventHandler + ?Sized> DispatchLoop<H> {
    pub fn new(queue: EventQueue, handler: Arc<H>, idle_timeout: Duration) -> Self {
        Self {
            queue,
            handler,
            idle_timeout,
        }
    }

    /// Drain the queue until idle, closed, or a fatal error.
    ///
    /// Per-event failures are logged and the event is dropped; only errors
    /// for which `DispatchError::is_fatal` holds end the loop with `Err`.
    pub async fn run(mut self) -> Result<LoopExit, DispatchError> {
        loop {
            let event = match tokio::time::timeout(self.idle_timeout, self.queue.recv()).await {
                Err(_) => {
                    tracing::info!(
                        "no URL received for {}s, shutting down",
                        self.idle_timeout.as_secs_f64()
                    );
                    return Ok(LoopExit::IdleTimeout);
                }
                Ok(None) => {
                    tracing::debug!("event sources closed, shutting down");
                    return Ok(LoopExit::SourceClosed);
                }
                Ok(Some(event)) => event,
            };

            let url = event.url.clone();
            tracing::info!(pid = event.pid, "URL received: {}", url);
            let started = Instant::now();
            let handler = Arc::clone(&self.handler);

            match tokio::task::spawn_blocking(move || handler.handle(event)).await {
                Ok(Ok(command)) => {
                    tracing::info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "dispatched {}: {}",
                        url,
                        command
                    );
                }
                Ok(Err(e)) if e.is_fatal() => {
                    tracing::error!(kind = e.kind(), "fatal error while handling {}: {}", url, e);
                    return Err(e);
                }
                Ok(Err(e)) => {
                    tracing::error!(kind = e.kind(), "abandoning {}: {}", url, e);
                }
                Err(e) => {
                    tracing::error!("handler for {} did not complete: {}", url, e);
                }
            }
        }
    }
}
