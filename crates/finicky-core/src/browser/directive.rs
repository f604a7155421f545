//! The launch decision returned by a policy.

use serde::{Deserialize, Serialize};

/// How `BrowserDirective::name` identifies the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppType {
    #[serde(rename = "bundleId", alias = "bundleID")]
    BundleId,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserDirective {
    pub name: String,
    pub app_type: AppType,
    pub open_in_background: bool,
    pub profile: Option<String>,
    pub args: Vec<String>,
    pub url: String,
}

/// Wire shape emitted by `openUrl`. Every field except `profile` is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDirective {
    name: String,
    app_type: AppType,
    open_in_background: bool,
    #[serde(default)]
    profile: Option<String>,
    args: Vec<String>,
    url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("openUrl returned no value")]
    Missing,
    #[error("{0}")]
    Shape(#[from] serde_json::Error),
    #[error("directive has an empty `{0}`")]
    Empty(&'static str),
}

impl BrowserDirective {
    /// Decode the JSON text of a guest directive, rejecting malformed shapes.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let raw: RawDirective = serde_json::from_str(json)?;
        if raw.name.trim().is_empty() {
            return Err(DecodeError::Empty("name"));
        }
        if raw.url.trim().is_empty() {
            return Err(DecodeError::Empty("url"));
        }
        Ok(Self {
            name: raw.name,
            app_type: raw.app_type,
            open_in_background: raw.open_in_background,
            profile: raw.profile.filter(|p| !p.is_empty()),
            args: raw.args,
            url: raw.url,
        })
    }
}
