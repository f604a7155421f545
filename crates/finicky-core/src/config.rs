use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Short URL resolution limits (optional `[short_url]` section in daemon.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortUrlConfig {
    /// Wall-clock timeout per request, in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of redirects followed per request.
    pub max_redirects: u32,
    /// User-Agent sent with HEAD/GET probes.
    pub user_agent: String,
}

impl Default for ShortUrlConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            max_redirects: 3,
            user_agent: "Finicky/4.0".to_string(),
        }
    }
}

impl ShortUrlConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Sandbox resource limits, applied to every fresh runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    pub memory_limit_bytes: usize,
    pub max_stack_bytes: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 64 * 1024 * 1024,
            max_stack_bytes: 1024 * 1024,
        }
    }
}

/// How launch commands are executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// The OS's generic "open application" program.
    pub program: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            program: "open".to_string(),
        }
    }
}

/// Daemon settings loaded from `~/.config/finicky/daemon.toml`.
///
/// This is not the routing policy; policies live in `~/.finicky.js` /
/// `~/.finicky.json` and are re-read on every URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Exit after this many seconds without a URL event.
    pub idle_timeout_secs: u64,
    pub short_url: ShortUrlConfig,
    pub sandbox: SandboxConfig,
    pub launcher: LauncherConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 10,
            short_url: ShortUrlConfig::default(),
            sandbox: SandboxConfig::default(),
            launcher: LauncherConfig::default(),
        }
    }
}

impl DaemonConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("finicky")?;
    Ok(xdg_dirs.get_config_home().join("finicky").join("daemon.toml"))
}

/// Load the daemon configuration, falling back to defaults when no file exists.
pub fn load_or_default() -> Result<DaemonConfig> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("no daemon config at {}, using defaults", path.display());
        return Ok(DaemonConfig::default());
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<DaemonConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read daemon config: {}", path.display()))?;
    let cfg: DaemonConfig = toml::from_str(&data)
        .with_context(|| format!("parse daemon config: {}", path.display()))?;
    Ok(cfg)
}
