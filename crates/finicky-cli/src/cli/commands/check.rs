//! `finicky check` – validate the policy.

use anyhow::{Context, Result};
use finicky_core::dispatch::DaemonContext;

pub async fn run_check(ctx: DaemonContext) -> Result<()> {
    let policy = tokio::task::spawn_blocking(move || ctx.pipeline().check())
        .await
        .context("check task join")??;

    match policy.compiled {
        Some(ref compiled) => {
            let modules = compiled.bundle()?.modules.len();
            println!("policy: {} ({} module(s))", compiled.source_path().display(), modules);
        }
        None => println!("policy: (none)"),
    }
    match policy.document_path {
        Some(ref path) => println!("simple policy: {}", path.display()),
        None => println!("simple policy: (none)"),
    }
    println!("configuration is valid");
    Ok(())
}
