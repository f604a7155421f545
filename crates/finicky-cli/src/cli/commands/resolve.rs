//! `finicky resolve <url>` – expand a shortened URL.

use anyhow::{Context, Result};
use finicky_core::config::DaemonConfig;
use finicky_core::shorturl::{CurlProbe, ShortenerDomains, UrlNormalizer};
use std::sync::Arc;

pub async fn run_resolve(cfg: &DaemonConfig, url: &str) -> Result<()> {
    let normalizer = UrlNormalizer::new(
        ShortenerDomains::new(),
        Arc::new(CurlProbe::new(&cfg.short_url)),
    );
    let url = url.to_string();
    let resolved = tokio::task::spawn_blocking(move || normalizer.resolve(&url))
        .await
        .context("resolve task join")??;
    println!("{}", resolved);
    Ok(())
}
