//! Short URL normalization.
//!
//! Policies match on literal hostnames, so a `bit.ly` link would never hit a
//! rule written for its real destination. Hosts on the shortener list are
//! resolved by following redirects (HEAD first, then one GET) before the
//! policy sees the URL.

mod domains;
mod probe;

pub use domains::{ShortenerDomains, SHORTENER_DOMAINS};
pub use probe::{CurlProbe, ProbeMethod, ProbeResponse, RedirectProbe};

use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShortUrlError {
    #[error("failed to parse URL: {0}")]
    Parse(String),
    #[error("{method} request failed: {message}")]
    Request { method: ProbeMethod, message: String },
    #[error("failed to resolve URL: status code {0}")]
    Status(u32),
}

/// A shortened URL that could not be resolved. Callers fall back to `original`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not resolve {original}: {reason}")]
pub struct UnresolvedUrl {
    pub original: String,
    #[source]
    pub reason: ShortUrlError,
}

pub struct UrlNormalizer {
    domains: ShortenerDomains,
    probe: Arc<dyn RedirectProbe>,
}

impl UrlNormalizer {
    pub fn new(domains: ShortenerDomains, probe: Arc<dyn RedirectProbe>) -> Self {
        Self { domains, probe }
    }

    /// Returns the final destination for shortener URLs and the input unchanged
    /// for everything else (without touching the network).
    pub fn resolve(&self, original: &str) -> Result<String, UnresolvedUrl> {
        let unresolved = |reason| UnresolvedUrl {
            original: original.to_string(),
            reason,
        };

        let parsed = Url::parse(original).map_err(|e| unresolved(ShortUrlError::Parse(e.to_string())))?;
        let host = match parsed.host_str() {
            Some(h) => h,
            None => return Ok(original.to_string()),
        };
        if !self.domains.matches(host) {
            return Ok(original.to_string());
        }

        tracing::debug!("URL host looks like a short URL: {}", host);

        match self.probe.fetch(ProbeMethod::Head, original) {
            Ok(resp) if resp.status == 200 => {
                tracing::debug!("resolved {} to {}", original, resp.final_url);
                return Ok(resp.final_url);
            }
            Ok(resp) => tracing::debug!("HEAD {} returned HTTP {}, retrying with GET", original, resp.status),
            Err(e) => tracing::debug!("HEAD {} failed ({}), retrying with GET", original, e),
        }

        match self.probe.fetch(ProbeMethod::Get, original) {
            Ok(resp) if resp.status == 200 => {
                tracing::debug!("resolved {} to {}", original, resp.final_url);
                Ok(resp.final_url)
            }
            Ok(resp) => Err(unresolved(ShortUrlError::Status(resp.status))),
            Err(message) => Err(unresolved(ShortUrlError::Request {
                method: ProbeMethod::Get,
                message,
            })),
        }
    }

    /// Like `resolve`, but logs failures and falls back to the original URL.
    pub fn resolve_or_original(&self, original: &str) -> String {
        self.resolve(original).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            e.original
        })
    }
}
