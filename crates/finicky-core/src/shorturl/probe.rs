//! HTTP probes used to follow shortener redirects.

use std::fmt;
use std::time::Duration;

use crate::config::ShortUrlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    Get,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Head => f.write_str("HEAD"),
            ProbeMethod::Get => f.write_str("GET"),
        }
    }
}

/// Outcome of one request after redirects were followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u32,
    /// URL of the last request in the redirect chain.
    pub final_url: String,
}

/// Issues a single request, following at most the configured number of redirects.
pub trait RedirectProbe: Send + Sync {
    fn fetch(&self, method: ProbeMethod, url: &str) -> Result<ProbeResponse, String>;
}

/// libcurl-backed probe.
#[derive(Debug, Clone)]
pub struct CurlProbe {
    timeout: Duration,
    max_redirects: u32,
    user_agent: String,
}

impl CurlProbe {
    pub fn new(cfg: &ShortUrlConfig) -> Self {
        Self {
            timeout: cfg.timeout(),
            max_redirects: cfg.max_redirects,
            user_agent: cfg.user_agent.clone(),
        }
    }

    fn perform(&self, method: ProbeMethod, url: &str) -> Result<ProbeResponse, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        match method {
            ProbeMethod::Head => easy.nobody(true)?,
            ProbeMethod::Get => easy.get(true)?,
        }
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.timeout(self.timeout)?;
        easy.useragent(&self.user_agent)?;

        {
            let mut transfer = easy.transfer();
            // Body is irrelevant; only the final location matters.
            transfer.write_function(|data| Ok(data.len()))?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        let final_url = easy.effective_url()?.unwrap_or(url).to_string();
        Ok(ProbeResponse { status, final_url })
    }
}

impl Default for CurlProbe {
    fn default() -> Self {
        Self::new(&ShortUrlConfig::default())
    }
}

impl RedirectProbe for CurlProbe {
    fn fetch(&self, method: ProbeMethod, url: &str) -> Result<ProbeResponse, String> {
        self.perform(method, url).map_err(|e| {
            if e.is_too_many_redirects() {
                format!("stopped after {} redirects", self.max_redirects)
            } else {
                e.to_string()
            }
        })
    }
}
