//! URL-open events as delivered by the OS bridge.

use serde::{Deserialize, Serialize};

/// The process that asked for the URL to be opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
    #[serde(rename = "bundleID")]
    pub bundle_id: String,
    pub path: String,
}

/// One URL-open request. Produced once per OS request and consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingUrlEvent {
    pub url: String,
    #[serde(default)]
    pub pid: i32,
    #[serde(default)]
    pub opener: Option<ProcessInfo>,
}

impl IncomingUrlEvent {
    pub fn new(url: impl Into<String>, pid: i32, opener: Option<ProcessInfo>) -> Self {
        Self {
            url: url.into(),
            pid,
            opener,
        }
    }

    /// Parse one line from a line-oriented event source.
    ///
    /// A line is either a bare URL or a JSON object `{"url", "pid"?, "opener"?}`.
    /// Blank lines yield `None`.
    pub fn from_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line.starts_with('{') {
            return serde_json::from_str(line).map(Some);
        }
        Ok(Some(Self::new(line, 0, None)))
    }
}
