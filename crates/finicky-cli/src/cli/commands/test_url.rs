//! `finicky test-url <url>` – dry run of the pipeline for one URL.

use anyhow::{Context, Result};
use finicky_core::dispatch::DaemonContext;
use finicky_core::event::IncomingUrlEvent;

pub async fn run_test_url(ctx: DaemonContext, url: &str, pid: i32) -> Result<()> {
    let event = IncomingUrlEvent::new(url, pid, None);
    let (directive, command) = tokio::task::spawn_blocking(move || ctx.pipeline().evaluate_only(&event))
        .await
        .context("evaluation task join")??;

    let report = serde_json::json!({
        "directive": directive,
        "command": command,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
