//! `finicky run [URL]...` – the dispatch daemon.

use anyhow::{Context, Result};
use finicky_core::dispatch::{self, DaemonContext, DispatchLoop};
use finicky_core::os::{ArgsSource, EventSource, StdinSource};
use std::sync::Arc;

pub async fn run_daemon(ctx: DaemonContext, urls: Vec<String>, read_stdin: bool) -> Result<()> {
    let idle_timeout = ctx.config.idle_timeout();
    let pipeline = Arc::new(ctx.pipeline());
    let (handle, queue) = dispatch::channel();

    let mut sources: Vec<Box<dyn EventSource>> = vec![Box::new(ArgsSource::new(urls))];
    if read_stdin {
        sources.push(Box::new(StdinSource));
    }
    for source in sources {
        // The stdin reader blocks on input; it is left running and ends with the process.
        let _ = source.start(handle.clone());
    }
    drop(handle);

    let exit = DispatchLoop::new(queue, pipeline, idle_timeout)
        .run()
        .await
        .context("dispatch loop stopped")?;
    tracing::info!("finicky exiting: {:?}", exit);
    Ok(())
}
